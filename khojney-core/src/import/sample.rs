//! Sample import files admins can download and fill in.

use super::csv::quote;

fn to_line(fields: &[&str]) -> String {
    fields.iter().map(|f| quote(f)).collect::<Vec<_>>().join(",")
}

/// A category file with a parent and a child row.
pub fn categories_csv() -> String {
    [
        super::categories::HEADERS.join(","),
        to_line(&[
            "Physics",
            "physics",
            "भौतिक विज्ञान",
            "Questions related to classical and modern physics.",
            "",
            "",
            "true",
        ]),
        to_line(&[
            "Quantum Mechanics",
            "quantum-mechanics",
            "क्वान्टम मेकानिक्स",
            "The study of matter and light on the atomic and subatomic scale.",
            "",
            "Physics",
            "true",
        ]),
    ]
    .join("\n")
        + "\n"
}

/// A question file with one four-option question.
pub fn questions_csv() -> String {
    [
        super::questions::headers().join(","),
        to_line(&[
            "What is the capital of France?",
            "easy",
            "1",
            "Paris is the capital city.",
            "true",
            "en",
            "General Knowledge|Geography",
            "London",
            "false",
            "Paris",
            "true",
            "Berlin",
            "false",
            "Madrid",
            "false",
        ]),
    ]
    .join("\n")
        + "\n"
}
