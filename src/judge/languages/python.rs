//! Python language handler

use crate::models::Language;

use super::LanguageHandler;

const HARNESS: &str = r#"if __name__ == "__main__":
    import json as __judge_json
    import sys as __judge_sys

    __judge_input = __judge_json.loads(__judge_sys.stdin.read())
    __judge_result = solution(__judge_input)
    __judge_sys.stdout.write("\n__RESULT_MARKER__" + __judge_json.dumps(__judge_result) + "\n")
"#;

/// Get handler for Python
pub fn handler() -> LanguageHandler {
    LanguageHandler {
        language: Language::Python,
        source_file: "main.py",
        interpreter: "python3",
        // Syntax check only
        check_args: &["-m", "py_compile"],
        harness: HARNESS,
        limits_address_space: true,
    }
}
