//! JavaScript language handler

use crate::models::Language;

use super::LanguageHandler;

/// Reads the input, awaits `solution` (sync or async) and reports the result.
/// Uncaught errors go to stderr with a non-zero exit.
const HARNESS: &str = r#";(async () => {
  const __judgeInput = JSON.parse(require('fs').readFileSync(0, 'utf8'));
  const __judgeResult = await solution(__judgeInput);
  const __judgeJson = JSON.stringify(__judgeResult === undefined ? null : __judgeResult);
  process.stdout.write('\n__RESULT_MARKER__' + __judgeJson + '\n');
})().catch((err) => {
  process.stderr.write(String(err && err.stack ? err.stack : err) + '\n');
  process.exit(1);
});
"#;

/// Get handler for JavaScript
pub fn handler() -> LanguageHandler {
    LanguageHandler {
        language: Language::JavaScript,
        source_file: "main.js",
        interpreter: "node",
        check_args: &["--check"],
        harness: HARNESS,
        // V8 reserves far more address space than it uses
        limits_address_space: false,
    }
}
