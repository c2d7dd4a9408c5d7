//! Linker flag syntax for embedding build metadata.

use regex::Regex;
use std::sync::LazyLock;

static GO_VERSION: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"go version go(\S+)"));

/// Extract the version from `go version` output (`go version go1.21.5 linux/amd64`)
pub fn parse_go_version(output: &str) -> Option<String> {
    let re = GO_VERSION.as_ref().ok()?;
    re.captures(output)
        .map(|caps| caps[1].trim().to_string())
}

/// How `-X` assignments are spelled for the linker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LdflagsSyntax {
    /// `-X name value`, Go 1.0 through 1.4
    Legacy,
    /// `-X name=value`
    #[default]
    Modern,
}

impl LdflagsSyntax {
    /// Pick the syntax for a toolchain version such as `1.4.2` or `1.21rc1`
    pub fn for_go_version(version: &str) -> Self {
        let mut parts = version.split('.');
        let major = parts.next().and_then(leading_number);
        let minor = parts.next().and_then(leading_number);
        match (major, minor) {
            (Some(1), Some(minor)) if minor <= 4 => LdflagsSyntax::Legacy,
            (Some(1), None) => LdflagsSyntax::Legacy,
            _ => LdflagsSyntax::Modern,
        }
    }

    /// Render one `-X` assignment
    pub fn assign(&self, name: &str, value: &str) -> String {
        match self {
            LdflagsSyntax::Legacy => format!("-X {} {}", name, value),
            LdflagsSyntax::Modern => format!("-X {}={}", name, value),
        }
    }

    /// Render the full `-ldflags` value embedding the build metadata
    pub fn render(&self, build_time: &str, version: &str, branch: &str, commit: &str) -> String {
        [
            self.assign("main.buildTime", &format!("'{}'", build_time)),
            self.assign("main.version", version),
            self.assign("main.branch", branch),
            self.assign("main.commit", commit),
        ]
        .join(" ")
    }
}

fn leading_number(part: &str) -> Option<u32> {
    let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
