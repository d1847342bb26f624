use bitechina_types::SubscriptionSnapshot;

/// Characters shown to readers without a subscription.
pub const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleView<'a> {
    Full(&'a str),
    Preview { text: &'a str, truncated: bool },
}

/// Subscribers get the whole article. Everyone else, including readers whose
/// subscription lookup failed, gets the preview.
pub fn gate_article<'a>(content: &'a str, snapshot: Option<&SubscriptionSnapshot>) -> ArticleView<'a> {
    if snapshot.is_some_and(|s| s.subscribed) {
        return ArticleView::Full(content);
    }
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => ArticleView::Preview {
            text: &content[..end],
            truncated: true,
        },
        None => ArticleView::Preview {
            text: content,
            truncated: false,
        },
    }
}
