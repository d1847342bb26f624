use chrono::NaiveDate;

const NEWSLETTER_NAME: &str = "BiteChina Newsletter";

/// Subject line dated like "BiteChina Newsletter - March 5, 2024".
pub fn digest_subject(sent_on: NaiveDate) -> String {
    format!("{} - {}", NEWSLETTER_NAME, sent_on.format("%B %-d, %Y"))
}

/// Plain newlines become HTML line breaks; the body is otherwise sent as stored.
pub fn digest_html(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\n', "<br />")
}

pub fn digest_email(content: &str, sent_on: NaiveDate) -> (String, String) {
    (digest_subject(sent_on), digest_html(content))
}
