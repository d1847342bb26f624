/// A digest item waiting to be mailed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushContent {
    pub id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// One failed delivery in a digest run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DeliveryFailure {
    pub email: String,
    pub error: String,
}
