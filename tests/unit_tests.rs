// Crate-level unit tests for the public API
// Module-local behavior is tested beside the code in src/

mod unit {
    mod glyph_tests;
    mod normalize_tests;
    mod options_tests;
    mod sanitizer_tests;
}
