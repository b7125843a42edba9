// Language Identification
// Filename-extension lookup first, regex content heuristics as fallback.
// Heuristics stay cheap (one pass per rule, no tokenization) because they
// run interactively; the answer labels a UI badge, it is not an exact
// classification.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{CodeSample, DetectionConfidence, DetectionResult};

/// Static extension map. Lookup is case-insensitive and ignores any path
/// prefix on the filename.
const EXTENSION_LANGUAGES: &[(&str, &str)] = &[
    ("py", "python"),
    ("js", "javascript"),
    ("ts", "typescript"),
    ("java", "java"),
    ("cpp", "c++"),
    ("c", "c"),
    ("cs", "c#"),
    ("rb", "ruby"),
    ("go", "go"),
    ("rs", "rust"),
    ("php", "php"),
    ("swift", "swift"),
    ("kt", "kotlin"),
    ("scala", "scala"),
    ("r", "r"),
    ("m", "matlab"),
    ("sql", "sql"),
    ("sh", "bash"),
];

/// A language paired with its content-matching rules. Declaration order in
/// `signatures()` is the tie-break priority: when two languages score the
/// same rule count, the first-declared one wins.
struct LanguageSignature {
    language: &'static str,
    rules: Vec<Regex>,
}

fn signature(language: &'static str, patterns: &[&str]) -> LanguageSignature {
    let rules = patterns
        .iter()
        .map(|p| Regex::new(p).expect("invalid language signature pattern"))
        .collect();
    LanguageSignature { language, rules }
}

fn signatures() -> &'static [LanguageSignature] {
    static SIGNATURES: OnceLock<Vec<LanguageSignature>> = OnceLock::new();
    SIGNATURES.get_or_init(|| {
        vec![
            signature(
                "python",
                &[
                    r"(?m)^\s*def\s+\w+\s*\(.*\)\s*:",
                    r"(?m)^\s*(?:import|from)\s+[A-Za-z_][\w.]*",
                    r"(?m)^\s*(?:elif|pass|lambda)\b",
                    r"\bself\b",
                    r"\bprint\s*\(",
                ],
            ),
            signature(
                "javascript",
                &[
                    r"\bfunction\s+\w+\s*\(",
                    r"=>",
                    r"\b(?:const|let)\s+\w+\s*=",
                    r"console\.log",
                    r"===|!==",
                ],
            ),
            signature(
                "typescript",
                &[
                    r"\binterface\s+\w+\s*\{",
                    r":\s*(?:string|number|boolean)\b",
                    r"\bexport\s+(?:default\s+)?(?:class|function|const|interface|type)\b",
                    r"\benum\s+\w+\s*\{",
                ],
            ),
            signature(
                "java",
                &[
                    r"\bpublic\s+(?:static\s+)?(?:final\s+)?class\s+\w+",
                    r"System\.out\.println",
                    r"\bpublic\s+static\s+void\s+main\b",
                    r"(?m)^\s*import\s+java\.",
                ],
            ),
            signature(
                "c++",
                &[
                    r"#include\s*<(?:iostream|vector|string|map|algorithm)>",
                    r"\bstd::",
                    r"\bcout\s*<<",
                    r"\btemplate\s*<",
                ],
            ),
            signature(
                "c",
                &[
                    r"#include\s*<(?:stdio|stdlib|string|math)\.h>",
                    r"\bprintf\s*\(",
                    r"\bmalloc\s*\(",
                    r"\bint\s+main\s*\(",
                ],
            ),
            signature(
                "c#",
                &[
                    r"(?m)^\s*using\s+System",
                    r"\bnamespace\s+\w+",
                    r"Console\.WriteLine",
                ],
            ),
            signature(
                "ruby",
                &[
                    r"(?m)^\s*def\s+\w+\s*$",
                    r"(?m)^\s*end\s*$",
                    r"\bputs\s",
                    r#"\brequire\s+['"]"#,
                ],
            ),
            signature(
                "go",
                &[
                    r"(?m)^\s*package\s+\w+",
                    r"\bfunc\s+\w+\s*\(",
                    r"\bfmt\.",
                    r":=",
                ],
            ),
            signature(
                "rust",
                &[
                    r"\bfn\s+\w+\s*\(",
                    r"\blet\s+mut\s+",
                    r"\bprintln!\s*\(",
                    r"\bimpl\s+\w+",
                    r"#\[derive\(",
                ],
            ),
            signature(
                "php",
                &[
                    r"<\?php",
                    r"\$\w+\s*=",
                    r"\becho\s",
                ],
            ),
        ]
    })
}

/// Best-guess language for a sample. Extension hits win outright (high
/// confidence, even over empty content); content heuristics answer with
/// medium confidence; no signal at all is a valid `None` result.
pub fn identify(sample: &CodeSample) -> DetectionResult {
    if let Some(filename) = sample.filename.as_deref() {
        if let Some(language) = identify_language_from_extension(filename) {
            return DetectionResult {
                language: Some(language.to_string()),
                confidence: DetectionConfidence::High,
            };
        }
    }

    identify_from_content(&sample.text)
}

/// Extension lookup only. Strips any path prefix, matches the final
/// extension case-insensitively.
pub fn identify_language_from_extension(filename: &str) -> Option<&'static str> {
    let basename = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let (stem, extension) = basename.rsplit_once('.')?;
    if stem.is_empty() {
        // Dotfiles like ".bashrc" carry no extension.
        return None;
    }
    let extension = extension.to_ascii_lowercase();
    EXTENSION_LANGUAGES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, language)| *language)
}

fn identify_from_content(text: &str) -> DetectionResult {
    if text.trim().is_empty() {
        return DetectionResult::none();
    }

    let mut best: Option<(&'static str, usize)> = None;
    for sig in signatures() {
        // Each rule contributes at most 1, however many times it matches.
        let hits = sig.rules.iter().filter(|rule| rule.is_match(text)).count();
        if hits == 0 {
            continue;
        }
        // Strictly-greater keeps the first-declared language on ties.
        let improved = match best {
            Some((_, best_hits)) => hits > best_hits,
            None => true,
        };
        if improved {
            best = Some((sig.language, hits));
        }
    }

    match best {
        Some((language, _)) => DetectionResult {
            language: Some(language.to_string()),
            confidence: DetectionConfidence::Medium,
        },
        None => DetectionResult::none(),
    }
}
