//! Styles command - list the bundled highlight schemes

use blogsmith_parser::SyntaxHighlighter;
use color_eyre::eyre::Result;

/// Run the styles command.
///
/// Every name printed can be used as a `highlights` entry in `theme.yaml`.
pub fn run() -> Result<()> {
    for name in names() {
        println!("{name}");
    }
    Ok(())
}

fn names() -> Vec<String> {
    SyntaxHighlighter::new()
        .available_themes()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let names = names();
        assert!(names.iter().any(|n| n == "base16-ocean.dark"));
        assert!(names.iter().any(|n| n == "InspiredGitHub"));
    }
}
