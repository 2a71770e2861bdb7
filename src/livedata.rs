//! Live data providers for informational topics
//!
//! Exchange rates, country facts, and leader facts come from external APIs
//! when available. `CachedLiveData` wraps any provider with a TTL cache and
//! falls back to the built-in static tables on error, so a live-data outage
//! never breaks the conversation.

use crate::error::{LiveDataError, LiveDataResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Default time-to-live for cached live data
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Default timeout for upstream requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The four safari countries the informational topics cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    Uganda,
    Kenya,
    Tanzania,
    Rwanda,
}

impl Country {
    /// All covered countries in display order
    pub const ALL: [Country; 4] = [
        Country::Uganda,
        Country::Kenya,
        Country::Tanzania,
        Country::Rwanda,
    ];

    /// ISO 3166-1 alpha-2 code
    pub fn alpha2(&self) -> &'static str {
        match self {
            Country::Uganda => "UG",
            Country::Kenya => "KE",
            Country::Tanzania => "TZ",
            Country::Rwanda => "RW",
        }
    }

    /// English display name
    pub fn name(&self) -> &'static str {
        match self {
            Country::Uganda => "Uganda",
            Country::Kenya => "Kenya",
            Country::Tanzania => "Tanzania",
            Country::Rwanda => "Rwanda",
        }
    }

    /// Flag emoji
    pub fn flag(&self) -> &'static str {
        match self {
            Country::Uganda => "🇺🇬",
            Country::Kenya => "🇰🇪",
            Country::Tanzania => "🇹🇿",
            Country::Rwanda => "🇷🇼",
        }
    }

    /// National currency code
    pub fn currency(&self) -> &'static str {
        match self {
            Country::Uganda => "UGX",
            Country::Kenya => "KES",
            Country::Tanzania => "TZS",
            Country::Rwanda => "RWF",
        }
    }
}

/// USD conversion rates keyed by currency code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    rates: HashMap<String, f64>,
}

impl ExchangeRates {
    /// Build from a code-to-rate map
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self { rates }
    }

    /// Rate for one USD in the given currency
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }
}

/// Basic facts about a country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryFacts {
    pub name: String,
    pub capital: String,
    pub population: u64,
    pub languages: String,
}

/// Facts about a country's head of state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderFacts {
    pub name: String,
    pub title: String,
    pub since: String,
    pub info: String,
}

/// Source of live data for the informational topics
#[async_trait]
pub trait LiveData: Send + Sync {
    /// Current USD exchange rates
    async fn exchange_rates(&self) -> LiveDataResult<ExchangeRates>;

    /// Facts about a covered country
    async fn country_facts(&self, country: Country) -> LiveDataResult<CountryFacts>;

    /// Facts about a covered country's leader
    async fn leader_facts(&self, country: Country) -> LiveDataResult<LeaderFacts>;
}

/// Provider backed by built-in tables. Always succeeds.
///
/// The figures match the hardcoded fallbacks shipped with the site widget.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLiveData;

impl StaticLiveData {
    /// The built-in rate table, available without awaiting
    pub fn rates(&self) -> ExchangeRates {
        let rates = HashMap::from([
            ("UGX".to_string(), 3750.0),
            ("KES".to_string(), 142.0),
            ("TZS".to_string(), 2485.0),
            ("RWF".to_string(), 1315.0),
            ("GBP".to_string(), 0.85),
            ("EUR".to_string(), 0.92),
            ("CAD".to_string(), 1.35),
            ("AUD".to_string(), 1.45),
        ]);
        ExchangeRates::new(rates)
    }

    /// The built-in facts table, available without awaiting
    pub fn facts(&self, country: Country) -> CountryFacts {
        let (capital, population, languages) = match country {
            Country::Uganda => ("Kampala", 48_600_000, "English, Luganda"),
            Country::Kenya => ("Nairobi", 55_100_000, "English, Swahili"),
            Country::Tanzania => ("Dodoma", 63_600_000, "Swahili, English"),
            Country::Rwanda => ("Kigali", 13_800_000, "Kinyarwanda, French, English"),
        };
        CountryFacts {
            name: country.name().to_string(),
            capital: capital.to_string(),
            population,
            languages: languages.to_string(),
        }
    }

    /// The built-in leader table, available without awaiting
    pub fn leader(&self, country: Country) -> LeaderFacts {
        let (name, since, info) = match country {
            Country::Uganda => (
                "Yoweri Museveni",
                "1986",
                "President since 1986, longest-serving current leader in East Africa",
            ),
            Country::Kenya => (
                "William Ruto",
                "2022",
                "President since September 2022, focused on economic transformation",
            ),
            Country::Tanzania => (
                "Samia Suluhu Hassan",
                "2021",
                "President since March 2021, first female president of Tanzania",
            ),
            Country::Rwanda => (
                "Paul Kagame",
                "2000",
                "President since 2000, known for post-genocide reconstruction",
            ),
        };
        LeaderFacts {
            name: name.to_string(),
            title: "President".to_string(),
            since: since.to_string(),
            info: info.to_string(),
        }
    }
}

#[async_trait]
impl LiveData for StaticLiveData {
    async fn exchange_rates(&self) -> LiveDataResult<ExchangeRates> {
        Ok(self.rates())
    }

    async fn country_facts(&self, country: Country) -> LiveDataResult<CountryFacts> {
        Ok(self.facts(country))
    }

    async fn leader_facts(&self, country: Country) -> LiveDataResult<LeaderFacts> {
        Ok(self.leader(country))
    }
}

#[derive(Debug, Default)]
struct CacheState {
    rates: Option<(Instant, ExchangeRates)>,
    countries: HashMap<Country, (Instant, CountryFacts)>,
    leaders: HashMap<Country, (Instant, LeaderFacts)>,
}

/// TTL cache around any provider, with static fallback on error.
///
/// Lookups hit the inner provider at most once per TTL window. When the
/// inner provider fails, the static tables answer instead and the failure
/// is logged; the error never propagates.
pub struct CachedLiveData<P: LiveData> {
    inner: P,
    fallback: StaticLiveData,
    ttl: Duration,
    state: RwLock<CacheState>,
}

impl<P: LiveData> CachedLiveData<P> {
    /// Wrap a provider with the default one-hour TTL
    pub fn new(inner: P) -> Self {
        Self::with_ttl(inner, DEFAULT_CACHE_TTL)
    }

    /// Wrap a provider with a custom TTL
    pub fn with_ttl(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            fallback: StaticLiveData,
            ttl,
            state: RwLock::new(CacheState::default()),
        }
    }

    fn fresh(&self, stamp: Instant) -> bool {
        stamp.elapsed() < self.ttl
    }
}

#[async_trait]
impl<P: LiveData> LiveData for CachedLiveData<P> {
    async fn exchange_rates(&self) -> LiveDataResult<ExchangeRates> {
        {
            let state = self.state.read().await;
            if let Some((stamp, rates)) = &state.rates {
                if self.fresh(*stamp) {
                    debug!("exchange rates served from cache");
                    return Ok(rates.clone());
                }
            }
        }

        match self.inner.exchange_rates().await {
            Ok(rates) => {
                let mut state = self.state.write().await;
                state.rates = Some((Instant::now(), rates.clone()));
                Ok(rates)
            }
            Err(err) => {
                warn!(error = %err, "exchange rate lookup failed, using static fallback");
                Ok(self.fallback.rates())
            }
        }
    }

    async fn country_facts(&self, country: Country) -> LiveDataResult<CountryFacts> {
        {
            let state = self.state.read().await;
            if let Some((stamp, facts)) = state.countries.get(&country) {
                if self.fresh(*stamp) {
                    return Ok(facts.clone());
                }
            }
        }

        match self.inner.country_facts(country).await {
            Ok(facts) => {
                let mut state = self.state.write().await;
                state.countries.insert(country, (Instant::now(), facts.clone()));
                Ok(facts)
            }
            Err(err) => {
                warn!(error = %err, ?country, "country lookup failed, using static fallback");
                Ok(self.fallback.facts(country))
            }
        }
    }

    async fn leader_facts(&self, country: Country) -> LiveDataResult<LeaderFacts> {
        {
            let state = self.state.read().await;
            if let Some((stamp, facts)) = state.leaders.get(&country) {
                if self.fresh(*stamp) {
                    return Ok(facts.clone());
                }
            }
        }

        match self.inner.leader_facts(country).await {
            Ok(facts) => {
                let mut state = self.state.write().await;
                state.leaders.insert(country, (Instant::now(), facts.clone()));
                Ok(facts)
            }
            Err(err) => {
                warn!(error = %err, ?country, "leader lookup failed, using static fallback");
                Ok(self.fallback.leader(country))
            }
        }
    }
}

/// Configuration for the HTTP-backed provider
#[derive(Debug, Clone)]
pub struct HttpLiveDataConfig {
    /// Base URL of the exchange rate API, e.g. `https://v6.exchangerate-api.com/v6/`
    pub exchange_base_url: String,
    /// API key appended to the exchange rate URL
    pub exchange_api_key: String,
    /// Base URL of the REST Countries API
    pub rest_countries_base_url: String,
    /// Base URL of the Wikipedia page-summary API
    pub wikipedia_base_url: String,
}

impl Default for HttpLiveDataConfig {
    fn default() -> Self {
        Self {
            exchange_base_url: "https://v6.exchangerate-api.com/v6/".to_string(),
            exchange_api_key: String::new(),
            rest_countries_base_url: "https://restcountries.com/v3.1".to_string(),
            wikipedia_base_url: "https://en.wikipedia.org/api/rest_v1/page/summary".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    result: String,
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct RestCountryResponse {
    name: RestCountryName,
    #[serde(default)]
    capital: Vec<String>,
    population: u64,
    #[serde(default)]
    languages: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RestCountryName {
    common: String,
}

#[derive(Debug, Deserialize)]
struct WikipediaSummaryResponse {
    title: String,
    extract: String,
}

/// Provider backed by public HTTP APIs
pub struct HttpLiveData {
    client: reqwest::Client,
    config: HttpLiveDataConfig,
}

impl HttpLiveData {
    /// Create a provider with the given configuration
    pub fn new(config: HttpLiveDataConfig) -> LiveDataResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LiveDataError::Internal(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl LiveData for HttpLiveData {
    async fn exchange_rates(&self) -> LiveDataResult<ExchangeRates> {
        let url = format!(
            "{}{}/latest/USD",
            self.config.exchange_base_url, self.config.exchange_api_key
        );
        let response: ExchangeRateResponse = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LiveDataError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| LiveDataError::MalformedResponse(e.to_string()))?;

        if response.result != "success" {
            return Err(LiveDataError::MalformedResponse(format!(
                "unexpected result field: {}",
                response.result
            )));
        }

        Ok(ExchangeRates::new(response.conversion_rates))
    }

    async fn country_facts(&self, country: Country) -> LiveDataResult<CountryFacts> {
        let url = format!(
            "{}/alpha/{}",
            self.config.rest_countries_base_url,
            country.alpha2()
        );
        let mut response: Vec<RestCountryResponse> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LiveDataError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| LiveDataError::MalformedResponse(e.to_string()))?;

        if response.is_empty() {
            return Err(LiveDataError::NotCovered(country.name().to_string()));
        }
        let entry = response.remove(0);

        let mut languages: Vec<String> = entry.languages.into_values().collect();
        languages.sort();

        Ok(CountryFacts {
            name: entry.name.common,
            capital: entry
                .capital
                .into_iter()
                .next()
                .unwrap_or_else(|| "N/A".to_string()),
            population: entry.population,
            languages: languages.join(", "),
        })
    }

    async fn leader_facts(&self, country: Country) -> LiveDataResult<LeaderFacts> {
        let url = format!(
            "{}/President_of_{}",
            self.config.wikipedia_base_url,
            country.name()
        );
        let response: WikipediaSummaryResponse = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LiveDataError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| LiveDataError::MalformedResponse(e.to_string()))?;

        Ok(LeaderFacts {
            name: response.title,
            title: "President".to_string(),
            since: String::new(),
            info: response.extract,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that counts calls and can be set to fail
    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingProvider {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl LiveData for CountingProvider {
        async fn exchange_rates(&self) -> LiveDataResult<ExchangeRates> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(LiveDataError::Request("upstream down".to_string()))
            } else {
                Ok(ExchangeRates::new(HashMap::from([(
                    "UGX".to_string(),
                    4000.0,
                )])))
            }
        }

        async fn country_facts(&self, country: Country) -> LiveDataResult<CountryFacts> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(LiveDataError::Request("upstream down".to_string()))
            } else {
                StaticLiveData.country_facts(country).await
            }
        }

        async fn leader_facts(&self, country: Country) -> LiveDataResult<LeaderFacts> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(LiveDataError::Request("upstream down".to_string()))
            } else {
                StaticLiveData.leader_facts(country).await
            }
        }
    }

    #[tokio::test]
    async fn test_static_exchange_rates() {
        let rates = StaticLiveData.exchange_rates().await.unwrap();
        assert_eq!(rates.rate("UGX"), Some(3750.0));
        assert_eq!(rates.rate("KES"), Some(142.0));
        assert_eq!(rates.rate("TZS"), Some(2485.0));
        assert_eq!(rates.rate("RWF"), Some(1315.0));
        assert_eq!(rates.rate("XYZ"), None);
    }

    #[tokio::test]
    async fn test_static_country_facts() {
        let facts = StaticLiveData.country_facts(Country::Rwanda).await.unwrap();
        assert_eq!(facts.name, "Rwanda");
        assert_eq!(facts.capital, "Kigali");
        assert_eq!(facts.population, 13_800_000);
    }

    #[tokio::test]
    async fn test_static_leader_facts() {
        let facts = StaticLiveData.leader_facts(Country::Tanzania).await.unwrap();
        assert_eq!(facts.name, "Samia Suluhu Hassan");
        assert_eq!(facts.since, "2021");
    }

    #[tokio::test]
    async fn test_cache_hits_inner_once_within_ttl() {
        let cached = CachedLiveData::new(CountingProvider::new(false));

        let first = cached.exchange_rates().await.unwrap();
        let second = cached.exchange_rates().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_expires_after_ttl() {
        let cached =
            CachedLiveData::with_ttl(CountingProvider::new(false), Duration::from_millis(10));

        cached.exchange_rates().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        cached.exchange_rates().await.unwrap();

        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_falls_back_statically_on_error() {
        let cached = CachedLiveData::new(CountingProvider::new(true));

        let rates = cached.exchange_rates().await.unwrap();
        assert_eq!(rates.rate("UGX"), Some(3750.0));

        let facts = cached.country_facts(Country::Kenya).await.unwrap();
        assert_eq!(facts.capital, "Nairobi");
    }

    #[test]
    fn test_country_metadata() {
        assert_eq!(Country::Uganda.alpha2(), "UG");
        assert_eq!(Country::Kenya.currency(), "KES");
        assert_eq!(Country::ALL.len(), 4);
    }
}
