//! Pricing page helpers: starting checkout and handling the return from it.

use std::time::Duration;

use bitechina_types::CheckoutRequest;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use url::Url;

use crate::{
    api::{CheckoutOutcome, SubscriptionApi},
    error::SdkError,
    locale::LocaleState,
    platform::{Navigator, strip_query_params},
    session::SessionBootstrapper,
};

/// Wait before re-checking the subscription after a successful checkout,
/// giving the processor time to activate it.
pub const RECHECK_DELAY: Duration = Duration::from_secs(2);

const RETURN_PARAMS: &[&str] = &["success", "canceled"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutReturn {
    Succeeded,
    Canceled,
    None,
}

/// Classifies the pricing page URL and returns it without the return markers.
pub fn inspect_checkout_return(url: &Url) -> (CheckoutReturn, Url) {
    let flag = |name: &str| url.query_pairs().any(|(k, v)| k == name && v == "true");
    let outcome = if flag("success") {
        CheckoutReturn::Succeeded
    } else if flag("canceled") {
        CheckoutReturn::Canceled
    } else {
        CheckoutReturn::None
    };
    (outcome, strip_query_params(url, RETURN_PARAMS))
}

pub fn checkout_region(country_code: Option<&str>) -> &'static str {
    match country_code {
        Some(code) if code.eq_ignore_ascii_case("KR") => "KR",
        _ => "DEFAULT",
    }
}

pub fn checkout_request(locale: &LocaleState) -> CheckoutRequest {
    CheckoutRequest {
        region: Some(checkout_region(locale.country_code()).to_string()),
        locale: Some(locale.language.as_str().to_string()),
    }
}

/// Cleans the return markers from the URL and, after a successful checkout,
/// schedules a subscription re-check.
pub fn handle_checkout_return(
    navigator: &dyn Navigator,
    session: &SessionBootstrapper,
    delay: Duration,
) -> (CheckoutReturn, Option<JoinHandle<()>>) {
    let current = navigator.current_url();
    let (outcome, cleaned) = inspect_checkout_return(&current);
    if cleaned != current {
        navigator.replace_url(&cleaned);
    }

    let recheck = match outcome {
        CheckoutReturn::Succeeded => {
            info!("Checkout completed, scheduling subscription re-check");
            Some(session.refresh_after(delay))
        }
        CheckoutReturn::Canceled => {
            info!("Checkout canceled");
            None
        }
        CheckoutReturn::None => None,
    };
    (outcome, recheck)
}

/// Asks the backend for a checkout session and navigates to it.
pub async fn begin_checkout(
    api: &dyn SubscriptionApi,
    navigator: &dyn Navigator,
    access_token: &str,
    locale: &LocaleState,
) -> Result<CheckoutOutcome, SdkError> {
    let outcome = api
        .create_checkout(access_token, &checkout_request(locale))
        .await?;
    match &outcome {
        CheckoutOutcome::Redirect(url) => navigator.redirect(url),
        CheckoutOutcome::CurrencyMismatch {
            current_currency,
            desired_currency,
            ..
        } => warn!(
            current_currency = %current_currency,
            desired_currency = %desired_currency,
            "Checkout blocked by existing subscription currency"
        ),
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitechina_types::Language;

    #[test]
    fn test_inspect_success() {
        let url = Url::parse("https://x.test/pricing?success=true").unwrap();
        let (outcome, cleaned) = inspect_checkout_return(&url);
        assert_eq!(outcome, CheckoutReturn::Succeeded);
        assert_eq!(cleaned.as_str(), "https://x.test/pricing");
    }

    #[test]
    fn test_inspect_canceled_keeps_other_params() {
        let url = Url::parse("https://x.test/pricing?canceled=true&plan=pro").unwrap();
        let (outcome, cleaned) = inspect_checkout_return(&url);
        assert_eq!(outcome, CheckoutReturn::Canceled);
        assert_eq!(cleaned.as_str(), "https://x.test/pricing?plan=pro");
    }

    #[test]
    fn test_inspect_plain_url() {
        let url = Url::parse("https://x.test/pricing").unwrap();
        assert_eq!(inspect_checkout_return(&url), (CheckoutReturn::None, url.clone()));
    }

    #[test]
    fn test_region_and_request() {
        assert_eq!(checkout_region(Some("kr")), "KR");
        assert_eq!(checkout_region(Some("US")), "DEFAULT");
        assert_eq!(checkout_region(None), "DEFAULT");

        let request = checkout_request(&LocaleState {
            language: Language::Ko,
            country_code: Some(*b"KR"),
        });
        assert_eq!(request.region.as_deref(), Some("KR"));
        assert_eq!(request.locale.as_deref(), Some("ko"));
    }
}
