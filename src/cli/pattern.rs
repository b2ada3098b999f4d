//! Match command implementation

use anyhow::Result;

use vox::CommandPattern;

/// Print the parameters `utterance` yields for `pattern`.
///
/// Returns false when the utterance does not match.
pub fn match_command(pattern: &str, utterance: &str) -> Result<bool> {
    let pattern = CommandPattern::new(pattern)?;

    if !pattern.matches(utterance) {
        println!("no match");
        return Ok(false);
    }

    let parameters = pattern.extract_parameters(utterance);
    if parameters.is_empty() {
        println!("matched \"{}\"", pattern);
    } else {
        for (name, value) in &parameters {
            println!("{} = {}", name, value);
        }
    }
    Ok(true)
}
