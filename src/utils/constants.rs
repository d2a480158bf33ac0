//! Shared configuration constants for pricescrape
//!
//! Default values for the resolver, its tiers and the automation session.
//! Every default here can be overridden through `ResolverConfig`.

/// Default time-to-live for cached product records: 1 hour
///
/// Listing prices change a few times a day at most. One hour keeps repeated
/// lookups of the same listing off the upstream tiers.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Query parameters that survive URL canonicalization
///
/// Both select a concrete product variation; every other parameter is
/// tracking noise and would fragment the cache.
pub const ALLOWED_QUERY_PARAMS: &[&str] = &["searchVariation", "pdp_filters"];

/// Host fragments accepted by the default host allow-list
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &["mercadolivre", "mercadolibre"];

/// Default retry budget for the structured API tier
pub const DEFAULT_API_MAX_ATTEMPTS: u32 = 2;

/// Default retry budget for the relay tier
pub const DEFAULT_RELAY_MAX_ATTEMPTS: u32 = 2;

/// Default retry budget for the browser tier
pub const DEFAULT_BROWSER_MAX_ATTEMPTS: u32 = 3;

/// Base delay before the first retry, doubled on every further attempt
pub const DEFAULT_RETRY_INITIAL_DELAY_MS: u64 = 1000;

/// Upper bound for a single backoff sleep
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 8000;

/// Default base URL of the marketplace items API
pub const DEFAULT_API_BASE_URL: &str = "https://api.mercadolibre.com";

/// Default timeout for a single structured API request
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 10;

/// Default relay (rotating proxy) endpoint
pub const DEFAULT_RELAY_ENDPOINT: &str = "https://api.scraperapi.com/";

/// Country code forwarded to the relay so it exits from a local IP
pub const DEFAULT_RELAY_COUNTRY: &str = "br";

/// Relay requests render through a remote proxy and are slow
pub const DEFAULT_RELAY_TIMEOUT_SECS: u64 = 60;

/// Navigation timeout for one browser attempt: 30 seconds
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 30;

/// Lower bound of the post-navigation settle window
pub const DEFAULT_SETTLE_MIN_MS: u64 = 1500;

/// Upper bound of the post-navigation settle window
pub const DEFAULT_SETTLE_MAX_MS: u64 = 3500;

/// Maximum number of browsing contexts open at the same time
///
/// Each context is a full renderer; two keeps a small VM responsive.
pub const DEFAULT_MAX_CONCURRENT_CONTEXTS: usize = 2;

/// File name of the cookie snapshot inside the data directory
pub const COOKIE_SNAPSHOT_FILE: &str = "cookies.json";

/// Chrome user agent passed on the command line at launch
///
/// Per-context identities override it through CDP.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// User agents rotated across browsing contexts
///
/// The navigator platform of each context is derived from its agent in
/// `automation::identity`.
pub const USER_AGENT_POOL: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.6778.205 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.6723.117 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.110 Safari/537.36",
];

/// Desktop viewports rotated across browsing contexts
pub const VIEWPORT_POOL: &[(u32, u32)] = &[
    (1920, 1080),
    (1600, 900),
    (1536, 864),
    (1440, 900),
    (1366, 768),
];

/// Locales rotated across browsing contexts, paired with their Accept-Language
pub const LOCALE_POOL: &[(&str, &str)] = &[
    ("pt-BR", "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7"),
    ("pt-BR", "pt-BR,pt;q=0.9"),
    ("pt-BR", "pt-BR,pt;q=0.8,en;q=0.6"),
];

/// Phrases that mark an anti-bot interstitial instead of a product page
///
/// Matched case-insensitively against the page title and visible text.
pub const BLOCK_PHRASES: &[&str] = &[
    "captcha",
    "are you a robot",
    "are you human",
    "verify you are human",
    "unusual traffic",
    "access denied",
    "acesso negado",
    "verifique que você não é um robô",
    "confirme que você não é um robô",
    "não sou um robô",
    "atividade incomum",
    "too many requests",
];

/// URL fragments of the marketplace's verification redirects
pub const BLOCK_URL_MARKERS: &[&str] = &[
    "/captcha",
    "/sorry/",
    "account-verification",
    "/gz/challenge",
];

/// Third-party hosts whose requests are failed before they leave the browser
pub const BLOCKED_TRACKER_HOSTS: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "doubleclick.net",
    "facebook.net",
    "hotjar.com",
    "clarity.ms",
    "newrelic.com",
    "nr-data.net",
    "bat.bing.com",
];
