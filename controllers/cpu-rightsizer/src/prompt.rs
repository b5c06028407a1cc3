//! Confirmation prompt.

use std::io::{self, BufRead, Write};

/// Ask a yes/no question; anything but `y`/`yes` (including end of input) is no.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<bool> {
    write!(output, "{} [y/N]: ", question)?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(typed: &str) -> (bool, String) {
        let mut input = typed.as_bytes();
        let mut output = Vec::new();
        let answer = confirm(&mut input, &mut output, "Proceed?").unwrap();
        (answer, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_yes_answers() {
        assert!(ask("y\n").0);
        assert!(ask("Y\n").0);
        assert!(ask("  yes \n").0);
    }

    #[test]
    fn test_default_is_no() {
        assert!(!ask("\n").0);
        assert!(!ask("n\n").0);
        assert!(!ask("sure\n").0);
    }

    #[test]
    fn test_end_of_input_is_no() {
        assert!(!ask("").0);
    }

    #[test]
    fn test_question_shows_default() {
        assert_eq!(ask("n\n").1, "Proceed? [y/N]: ");
    }
}
