//! Whole-bulletin XML provider: one request fetches every currency quoted
//! for a day, and the requested code is picked out of the document.

use crate::error::RateError;
use crate::provider::RateProvider;
use crate::rate::RateRecord;
use async_trait::async_trait;
use chrono::NaiveDate;
use encoding_rs::WINDOWS_1251;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Date format the bulletin endpoint expects in the query string.
const REQUEST_DATE_FORMAT: &str = "%d/%m/%Y";

/// Rates parsed from one bulletin, keyed by lowercase currency code.
type DayRates = HashMap<String, RateRecord>;

/// Bulletins already parsed during this run, keyed by date.
///
/// A batch of N currencies for one date downloads and parses the document
/// once. Constructed at process start and handed to the provider; the handle
/// is released with the run.
#[derive(Clone, Default)]
pub struct DayCache {
    inner: Arc<Mutex<HashMap<NaiveDate, Arc<DayRates>>>>,
}

impl DayCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get(&self, date: &NaiveDate) -> Option<Arc<DayRates>> {
        let days = self.inner.lock().await;
        let rates = days.get(date).cloned();
        if rates.is_some() {
            debug!(%date, "bulletin already parsed this run");
        }
        rates
    }

    async fn put(&self, date: NaiveDate, rates: Arc<DayRates>) {
        let mut days = self.inner.lock().await;
        days.insert(date, rates);
    }
}

#[derive(Debug, Deserialize)]
struct Bulletin {
    #[serde(rename = "Valute", default)]
    entries: Vec<BulletinEntry>,
}

#[derive(Debug, Deserialize)]
struct BulletinEntry {
    #[serde(rename = "CharCode")]
    char_code: String,
    #[serde(rename = "Nominal")]
    nominal: i64,
    #[serde(rename = "Value")]
    value: String,
}

impl BulletinEntry {
    /// Converts the raw bulletin row into a record for `date`. The quoted
    /// value uses a decimal comma.
    fn into_record(self, date: NaiveDate) -> Result<RateRecord, RateError> {
        let raw_value: f64 = self.value.replace(',', ".").parse().map_err(|_| {
            RateError::MalformedResponse(format!(
                "invalid rate value '{}' for '{}'",
                self.value, self.char_code
            ))
        })?;

        Ok(RateRecord {
            currency: self.char_code.to_lowercase(),
            date,
            raw_value,
            divisor: self.nominal,
            delta: None,
        })
    }
}

pub struct BulletinProvider {
    base_url: String,
    client: reqwest::Client,
    days: DayCache,
}

impl BulletinProvider {
    pub fn new(base_url: &str, client: reqwest::Client, days: DayCache) -> Self {
        Self {
            base_url: base_url.to_string(),
            client,
            days,
        }
    }

    async fn rates_for(&self, date: NaiveDate) -> Result<Arc<DayRates>, RateError> {
        if let Some(rates) = self.days.get(&date).await {
            return Ok(rates);
        }

        let url = format!(
            "{}/scripts/XML_daily.asp?date_req={}",
            self.base_url,
            date.format(REQUEST_DATE_FORMAT)
        );
        debug!("requesting daily bulletin from {url}");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        let bulletin = parse_bulletin(&body)?;

        let mut rates = DayRates::new();
        for entry in bulletin.entries {
            let code = entry.char_code.to_lowercase();
            rates.insert(code, entry.into_record(date)?);
        }

        let rates = Arc::new(rates);
        self.days.put(date, Arc::clone(&rates)).await;
        Ok(rates)
    }
}

/// The bulletin is served as windows-1251; decode before parsing.
fn parse_bulletin(body: &[u8]) -> Result<Bulletin, RateError> {
    let (text, _, had_errors) = WINDOWS_1251.decode(body);
    if had_errors {
        return Err(RateError::MalformedResponse(
            "bulletin is not valid windows-1251".to_string(),
        ));
    }

    quick_xml::de::from_str(&text)
        .map_err(|e| RateError::MalformedResponse(format!("cannot parse bulletin: {e}")))
}

#[async_trait]
impl RateProvider for BulletinProvider {
    async fn fetch_rate(
        &self,
        currency: &str,
        date: NaiveDate,
    ) -> Result<RateRecord, RateError> {
        let rates = self.rates_for(date).await?;
        rates
            .get(&currency.to_lowercase())
            .cloned()
            .ok_or_else(|| RateError::UnknownCurrency(currency.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::http_client;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MOCK_BULLETIN: &str = r#"<?xml version="1.0" encoding="windows-1251"?>
<ValCurs Date="10.01.2024" name="Foreign Currency Market">
  <Valute ID="R01235">
    <NumCode>840</NumCode>
    <CharCode>USD</CharCode>
    <Nominal>1</Nominal>
    <Name>US Dollar</Name>
    <Value>91,00</Value>
  </Valute>
  <Valute ID="R01720">
    <NumCode>980</NumCode>
    <CharCode>UAH</CharCode>
    <Nominal>10</Nominal>
    <Name>Hryvnia</Name>
    <Value>241,32</Value>
  </Valute>
</ValCurs>"#;

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    async fn mock_bulletin_server(body: Vec<u8>) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/scripts/XML_daily.asp"))
            .and(query_param("date_req", "10/01/2024"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn provider(server: &MockServer) -> BulletinProvider {
        BulletinProvider::new(&server.uri(), http_client().unwrap(), DayCache::new())
    }

    #[tokio::test]
    async fn test_fetches_and_normalizes_a_quote() {
        let server = mock_bulletin_server(MOCK_BULLETIN.into()).await;
        let provider = provider(&server);

        let record = provider.fetch_rate("usd", test_date()).await.unwrap();
        assert_eq!(record.row(), vec!["10.01.2024", "USD", "91.00"]);
        assert_eq!(record.delta, None);
    }

    #[tokio::test]
    async fn test_nominal_is_kept_as_divisor() {
        let server = mock_bulletin_server(MOCK_BULLETIN.into()).await;
        let provider = provider(&server);

        let record = provider.fetch_rate("UAH", test_date()).await.unwrap();
        assert_eq!(record.raw_value, 241.32);
        assert_eq!(record.divisor, 10);
        assert_eq!(record.row(), vec!["10.01.2024", "UAH", "24.13"]);
    }

    #[tokio::test]
    async fn test_decodes_windows_1251_bytes() {
        // "Доллар США" in windows-1251, embedded in an otherwise ASCII document.
        let mut body = Vec::new();
        body.extend_from_slice(
            br#"<?xml version="1.0" encoding="windows-1251"?>
<ValCurs Date="10.01.2024" name="Foreign Currency Market">
  <Valute ID="R01235">
    <NumCode>840</NumCode>
    <CharCode>USD</CharCode>
    <Nominal>1</Nominal>
    <Name>"#,
        );
        body.extend_from_slice(&[
            0xC4, 0xEE, 0xEB, 0xEB, 0xE0, 0xF0, 0x20, 0xD1, 0xD8, 0xC0,
        ]);
        body.extend_from_slice(
            br#"</Name>
    <Value>91,00</Value>
  </Valute>
</ValCurs>"#,
        );

        let server = mock_bulletin_server(body).await;
        let provider = provider(&server);

        let record = provider.fetch_rate("usd", test_date()).await.unwrap();
        assert_eq!(record.raw_value, 91.0);
    }

    #[tokio::test]
    async fn test_unlisted_currency_is_unknown() {
        let server = mock_bulletin_server(MOCK_BULLETIN.into()).await;
        let provider = provider(&server);

        let result = provider.fetch_rate("xyz", test_date()).await;
        assert!(matches!(result, Err(RateError::UnknownCurrency(c)) if c == "xyz"));
    }

    #[tokio::test]
    async fn test_one_download_serves_a_whole_batch() {
        let server = mock_bulletin_server(MOCK_BULLETIN.into()).await;
        let provider = provider(&server);

        provider.fetch_rate("usd", test_date()).await.unwrap();
        provider.fetch_rate("uah", test_date()).await.unwrap();

        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_document_is_malformed() {
        let server = mock_bulletin_server(b"not a bulletin <".to_vec()).await;
        let provider = provider(&server);

        let result = provider.fetch_rate("usd", test_date()).await;
        assert!(matches!(result, Err(RateError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_invalid_value_is_malformed() {
        let body = MOCK_BULLETIN.replace("91,00", "ninety-one");
        let server = mock_bulletin_server(body.into_bytes()).await;
        let provider = provider(&server);

        let result = provider.fetch_rate("usd", test_date()).await;
        assert!(matches!(result, Err(RateError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_server_error_is_a_network_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/scripts/XML_daily.asp"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let provider = provider(&server);

        let result = provider.fetch_rate("usd", test_date()).await;
        assert!(matches!(result, Err(RateError::Network(_))));
    }
}
