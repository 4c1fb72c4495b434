//! Pure classification of raw job fields.
//!
//! Everything in this module is deterministic keyword matching over
//! lowercased input. No I/O, no allocation beyond the returned values, so the
//! classifiers can run inline during record construction.

use chrono::{DateTime, NaiveDate};

/// Coarse geographic region of a listing, derived from its raw location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Eu,
    Us,
    Uk,
    Remote,
    Apac,
    Latam,
    Other,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Eu => "EU",
            Region::Us => "US",
            Region::Uk => "UK",
            Region::Remote => "REMOTE",
            Region::Apac => "APAC",
            Region::Latam => "LATAM",
            Region::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Region {
        match s {
            "EU" => Region::Eu,
            "US" => Region::Us,
            "UK" => Region::Uk,
            "REMOTE" => Region::Remote,
            "APAC" => Region::Apac,
            "LATAM" => Region::Latam,
            _ => Region::Other,
        }
    }
}

/// Continent bucket used for reporting. Computed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Continent {
    Africa,
    Antarctica,
    Asia,
    Europe,
    MiddleEast,
    NorthAmerica,
    Oceania,
    SouthAmerica,
    Remote,
    Other,
}

impl Continent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Continent::Africa => "Africa",
            Continent::Antarctica => "Antarctica",
            Continent::Asia => "Asia",
            Continent::Europe => "Europe",
            Continent::MiddleEast => "Middle East",
            Continent::NorthAmerica => "North America",
            Continent::Oceania => "Oceania",
            Continent::SouthAmerica => "South America",
            Continent::Remote => "Remote",
            Continent::Other => "Other",
        }
    }
}

/// Seniority band of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seniority {
    Intern,
    Leadership,
    Staff,
    Lead,
    Senior,
    Junior,
    Mid,
}

impl Seniority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Seniority::Intern => "INTERN",
            Seniority::Leadership => "LEADERSHIP",
            Seniority::Staff => "STAFF",
            Seniority::Lead => "LEAD",
            Seniority::Senior => "SENIOR",
            Seniority::Junior => "JUNIOR",
            Seniority::Mid => "MID",
        }
    }

    pub fn parse(s: &str) -> Seniority {
        match s {
            "INTERN" => Seniority::Intern,
            "LEADERSHIP" => Seniority::Leadership,
            "STAFF" => Seniority::Staff,
            "LEAD" => Seniority::Lead,
            "SENIOR" => Seniority::Senior,
            "JUNIOR" => Seniority::Junior,
            _ => Seniority::Mid,
        }
    }
}

// ---------------------------------------------------------------------------
// Gazetteers
// ---------------------------------------------------------------------------

const REMOTE_KEYWORDS: &[&str] = &[
    "remote",
    "worldwide",
    "anywhere",
    "distributed",
    "global",
    "fully remote",
    "work from home",
    "wfh",
    "location flexible",
];

const UK_KEYWORDS: &[&str] = &[
    "london",
    "manchester",
    "birmingham",
    "leeds",
    "glasgow",
    "edinburgh",
    "bristol",
    "liverpool",
    "united kingdom",
    "uk",
    "england",
    "scotland",
    "wales",
    "great britain",
];

const EU_COUNTRIES: &[&str] = &[
    "germany",
    "france",
    "netherlands",
    "spain",
    "italy",
    "sweden",
    "denmark",
    "finland",
    "norway",
    "poland",
    "portugal",
    "belgium",
    "austria",
    "switzerland",
    "ireland",
    "czech republic",
    "czechia",
    "romania",
    "hungary",
    "greece",
    "slovakia",
    "croatia",
    "bulgaria",
    "estonia",
    "latvia",
    "lithuania",
    "luxembourg",
    "malta",
    "cyprus",
    "slovenia",
    "europe",
    "european union",
];

const EU_CITIES: &[&str] = &[
    "berlin",
    "munich",
    "hamburg",
    "frankfurt",
    "cologne",
    "paris",
    "lyon",
    "marseille",
    "amsterdam",
    "rotterdam",
    "utrecht",
    "the hague",
    "madrid",
    "barcelona",
    "valencia",
    "milan",
    "rome",
    "florence",
    "turin",
    "stockholm",
    "gothenburg",
    "copenhagen",
    "aarhus",
    "helsinki",
    "oslo",
    "warsaw",
    "krakow",
    "wroclaw",
    "lisbon",
    "porto",
    "brussels",
    "antwerp",
    "vienna",
    "zurich",
    "geneva",
    "bern",
    "dublin",
    "prague",
    "budapest",
    "bucharest",
    "riga",
    "tallinn",
    "vilnius",
];

const US_STATES: &[&str] = &[
    "alabama",
    "alaska",
    "arizona",
    "arkansas",
    "california",
    "colorado",
    "connecticut",
    "delaware",
    "florida",
    "georgia",
    "hawaii",
    "idaho",
    "illinois",
    "indiana",
    "iowa",
    "kansas",
    "kentucky",
    "louisiana",
    "maine",
    "maryland",
    "massachusetts",
    "michigan",
    "minnesota",
    "mississippi",
    "missouri",
    "montana",
    "nebraska",
    "nevada",
    "new hampshire",
    "new jersey",
    "new mexico",
    "new york",
    "north carolina",
    "north dakota",
    "ohio",
    "oklahoma",
    "oregon",
    "pennsylvania",
    "rhode island",
    "south carolina",
    "south dakota",
    "tennessee",
    "texas",
    "utah",
    "vermont",
    "virginia",
    "washington",
    "west virginia",
    "wisconsin",
    "wyoming",
    "district of columbia",
];

const US_CITIES: &[&str] = &[
    "new york",
    "san francisco",
    "los angeles",
    "chicago",
    "seattle",
    "boston",
    "austin",
    "denver",
    "atlanta",
    "miami",
    "dallas",
    "houston",
    "phoenix",
    "portland",
    "san jose",
    "san diego",
    "minneapolis",
    "detroit",
    "washington dc",
    "nyc",
    "united states",
    "usa",
    "u.s.",
    "u.s.a.",
];

const APAC_KEYWORDS: &[&str] = &[
    "australia",
    "sydney",
    "melbourne",
    "brisbane",
    "perth",
    "new zealand",
    "auckland",
    "wellington",
    "singapore",
    "india",
    "bangalore",
    "bengaluru",
    "mumbai",
    "delhi",
    "hyderabad",
    "japan",
    "tokyo",
    "osaka",
    "china",
    "shanghai",
    "beijing",
    "shenzhen",
    "hong kong",
    "korea",
    "seoul",
    "taiwan",
    "taipei",
    "indonesia",
    "jakarta",
    "philippines",
    "manila",
    "vietnam",
    "thailand",
    "bangkok",
    "malaysia",
    "kuala lumpur",
    "apac",
];

const LATAM_KEYWORDS: &[&str] = &[
    "brazil",
    "sao paulo",
    "são paulo",
    "rio de janeiro",
    "mexico",
    "mexico city",
    "argentina",
    "buenos aires",
    "colombia",
    "bogota",
    "bogotá",
    "chile",
    "santiago",
    "peru",
    "lima",
    "uruguay",
    "montevideo",
    "latam",
    "latin america",
];

const ANTARCTICA_KEYWORDS: &[&str] = &["antarctica", "mcmurdo"];

const AFRICA_KEYWORDS: &[&str] = &[
    "south africa",
    "cape town",
    "johannesburg",
    "nigeria",
    "lagos",
    "kenya",
    "nairobi",
    "egypt",
    "cairo",
    "ghana",
    "accra",
    "morocco",
    "casablanca",
    "africa",
];

const MIDDLE_EAST_KEYWORDS: &[&str] = &[
    "israel",
    "tel aviv",
    "united arab emirates",
    "uae",
    "dubai",
    "abu dhabi",
    "saudi arabia",
    "riyadh",
    "qatar",
    "doha",
    "middle east",
];

const OCEANIA_KEYWORDS: &[&str] = &[
    "australia",
    "sydney",
    "melbourne",
    "brisbane",
    "perth",
    "new zealand",
    "auckland",
    "wellington",
    "oceania",
];

const NORTH_AMERICA_EXTRA: &[&str] = &[
    "canada",
    "toronto",
    "vancouver",
    "montreal",
    "ottawa",
    "north america",
];

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| haystack.contains(kw))
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// Map a raw location string to a coarse region.
///
/// Remote signals are checked before any geographic gazetteer, so
/// "Remote, Germany" classifies as `Remote` rather than `Eu`.
pub fn classify_region(location: Option<&str>) -> Region {
    let loc = match location {
        Some(l) if !l.trim().is_empty() => l.to_lowercase(),
        _ => return Region::Other,
    };

    if contains_any(&loc, REMOTE_KEYWORDS) {
        return Region::Remote;
    }
    if contains_any(&loc, UK_KEYWORDS) {
        return Region::Uk;
    }
    if contains_any(&loc, EU_COUNTRIES) || contains_any(&loc, EU_CITIES) {
        return Region::Eu;
    }
    if contains_any(&loc, US_STATES) || contains_any(&loc, US_CITIES) {
        return Region::Us;
    }
    if contains_any(&loc, APAC_KEYWORDS) {
        return Region::Apac;
    }
    if contains_any(&loc, LATAM_KEYWORDS) {
        return Region::Latam;
    }
    Region::Other
}

// ---------------------------------------------------------------------------
// Continent
// ---------------------------------------------------------------------------

/// Map a raw location string to a continent, falling back to the region when
/// no textual match exists.
///
/// Antarctica and Africa are checked before the broader Asia/Europe/North
/// America gazetteers: "South Africa" must not hit a generic keyword first.
pub fn classify_continent(location: Option<&str>, region_fallback: Region) -> Continent {
    if let Some(l) = location {
        let loc = l.to_lowercase();
        if !loc.trim().is_empty() {
            if contains_any(&loc, REMOTE_KEYWORDS) {
                return Continent::Remote;
            }
            if contains_any(&loc, ANTARCTICA_KEYWORDS) {
                return Continent::Antarctica;
            }
            if contains_any(&loc, AFRICA_KEYWORDS) {
                return Continent::Africa;
            }
            if contains_any(&loc, MIDDLE_EAST_KEYWORDS) {
                return Continent::MiddleEast;
            }
            if contains_any(&loc, OCEANIA_KEYWORDS) {
                return Continent::Oceania;
            }
            if contains_any(&loc, LATAM_KEYWORDS) {
                return Continent::SouthAmerica;
            }
            if contains_any(&loc, APAC_KEYWORDS) {
                return Continent::Asia;
            }
            if contains_any(&loc, UK_KEYWORDS)
                || contains_any(&loc, EU_COUNTRIES)
                || contains_any(&loc, EU_CITIES)
            {
                return Continent::Europe;
            }
            if contains_any(&loc, US_STATES)
                || contains_any(&loc, US_CITIES)
                || contains_any(&loc, NORTH_AMERICA_EXTRA)
            {
                return Continent::NorthAmerica;
            }
        }
    }

    match region_fallback {
        Region::Eu | Region::Uk => Continent::Europe,
        Region::Us => Continent::NorthAmerica,
        Region::Apac => Continent::Asia,
        Region::Latam => Continent::SouthAmerica,
        Region::Remote => Continent::Remote,
        Region::Other => Continent::Other,
    }
}

// ---------------------------------------------------------------------------
// Country (reporting only)
// ---------------------------------------------------------------------------

const COUNTRY_TABLE: &[(&str, &str)] = &[
    ("germany", "Germany"),
    ("berlin", "Germany"),
    ("munich", "Germany"),
    ("france", "France"),
    ("paris", "France"),
    ("netherlands", "Netherlands"),
    ("amsterdam", "Netherlands"),
    ("spain", "Spain"),
    ("madrid", "Spain"),
    ("barcelona", "Spain"),
    ("italy", "Italy"),
    ("milan", "Italy"),
    ("sweden", "Sweden"),
    ("stockholm", "Sweden"),
    ("denmark", "Denmark"),
    ("copenhagen", "Denmark"),
    ("finland", "Finland"),
    ("helsinki", "Finland"),
    ("norway", "Norway"),
    ("oslo", "Norway"),
    ("poland", "Poland"),
    ("warsaw", "Poland"),
    ("portugal", "Portugal"),
    ("lisbon", "Portugal"),
    ("austria", "Austria"),
    ("vienna", "Austria"),
    ("switzerland", "Switzerland"),
    ("zurich", "Switzerland"),
    ("ireland", "Ireland"),
    ("dublin", "Ireland"),
    ("united kingdom", "United Kingdom"),
    ("london", "United Kingdom"),
    ("canada", "Canada"),
    ("toronto", "Canada"),
    ("vancouver", "Canada"),
    ("united states", "United States"),
    ("new york", "United States"),
    ("san francisco", "United States"),
    ("australia", "Australia"),
    ("sydney", "Australia"),
    ("new zealand", "New Zealand"),
    ("singapore", "Singapore"),
    ("india", "India"),
    ("japan", "Japan"),
    ("israel", "Israel"),
    ("brazil", "Brazil"),
    ("mexico", "Mexico"),
    ("argentina", "Argentina"),
    ("south africa", "South Africa"),
];

/// Best-effort country name for a location, for reporting rollups.
pub fn extract_country(location: Option<&str>, region_fallback: Region) -> Option<String> {
    if let Some(l) = location {
        let loc = l.to_lowercase();
        for (kw, country) in COUNTRY_TABLE {
            if loc.contains(kw) {
                return Some((*country).to_string());
            }
        }
    }
    match region_fallback {
        Region::Us => Some("United States".to_string()),
        Region::Uk => Some("United Kingdom".to_string()),
        Region::Remote => Some("Remote".to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Seniority
// ---------------------------------------------------------------------------

const INTERN_KEYWORDS: &[&str] = &["intern", "internship", "apprentice"];
const LEADERSHIP_KEYWORDS: &[&str] = &[
    "director",
    "vp",
    "vice president",
    "head of",
    "cpo",
    "chief product",
];
const STAFF_KEYWORDS: &[&str] = &["staff", "principal", "distinguished"];
const LEAD_KEYWORDS: &[&str] = &["lead", "group product"];
const SENIOR_KEYWORDS: &[&str] = &["senior", "sr."];
const JUNIOR_KEYWORDS: &[&str] = &["junior", "associate", "entry-level", "entry level", "jr."];

/// Ordered cascade; the most senior matching category wins on overlap, so
/// "Senior Staff Product Manager" is `Staff`, not `Senior`.
pub fn classify_seniority(title: &str) -> Seniority {
    let t = title.to_lowercase();
    if contains_any(&t, INTERN_KEYWORDS) {
        return Seniority::Intern;
    }
    if contains_any(&t, LEADERSHIP_KEYWORDS) {
        return Seniority::Leadership;
    }
    if contains_any(&t, STAFF_KEYWORDS) {
        return Seniority::Staff;
    }
    if contains_any(&t, LEAD_KEYWORDS) {
        return Seniority::Lead;
    }
    if contains_any(&t, SENIOR_KEYWORDS) {
        return Seniority::Senior;
    }
    if contains_any(&t, JUNIOR_KEYWORDS) {
        return Seniority::Junior;
    }
    Seniority::Mid
}

// ---------------------------------------------------------------------------
// Role relevance
// ---------------------------------------------------------------------------

const INCLUDE_KEYWORDS: &[&str] = &[
    "product manager",
    "product management",
    "group product",
    "staff pm",
    "senior pm",
    "principal pm",
    "product lead",
    "vp product",
    "vp of product",
    "head of product",
    "chief product",
    "cpo",
    "product owner",
    "technical product",
    "growth pm",
    "platform pm",
    "ai pm",
];

const EXCLUDE_KEYWORDS: &[&str] = &[
    "product marketing",
    "product analyst",
    "data analyst",
    "software engineer",
    "engineering manager",
    "designer",
    "product operations analyst",
];

/// Whether a title is in the target role category. The exclude list takes
/// precedence over the include list.
pub fn is_relevant_role(title: &str) -> bool {
    let t = title.to_lowercase();
    if contains_any(&t, EXCLUDE_KEYWORDS) {
        return false;
    }
    contains_any(&t, INCLUDE_KEYWORDS)
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Epoch values above this are taken to be milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Normalize a vendor date field into a calendar date.
///
/// Accepts epoch seconds or milliseconds, RFC 3339 / ISO 8601 variants, and
/// plain `YYYY-MM-DD` / `YYYY/MM/DD`. Unparseable input yields `None`, never
/// an error.
pub fn normalize_date(raw: &serde_json::Value) -> Option<NaiveDate> {
    match raw {
        serde_json::Value::Number(n) => {
            let epoch = if let Some(i) = n.as_i64() {
                i
            } else {
                n.as_f64()? as i64
            };
            normalize_epoch(epoch)
        }
        serde_json::Value::String(s) => parse_date_str(s),
        _ => None,
    }
}

fn normalize_epoch(epoch: i64) -> Option<NaiveDate> {
    let secs = if epoch > EPOCH_MILLIS_THRESHOLD {
        epoch / 1000
    } else {
        epoch
    };
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

/// Parse a date-ish string; `None` on anything unrecognized.
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    // Offsets without a colon ("+0200") are not RFC 3339
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.date_naive());
    }
    if s.len() >= 10 {
        for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
            if let Ok(d) = NaiveDate::parse_from_str(&s[..10], fmt) {
                return Some(d);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_signal_wins_over_country() {
        assert_eq!(classify_region(Some("Remote, Germany")), Region::Remote);
        assert_eq!(classify_region(Some("Berlin, Germany")), Region::Eu);
    }

    #[test]
    fn uk_checked_before_eu() {
        assert_eq!(classify_region(Some("London, UK")), Region::Uk);
    }

    #[test]
    fn apac_and_latam_regions() {
        assert_eq!(classify_region(Some("Singapore")), Region::Apac);
        assert_eq!(classify_region(Some("São Paulo, Brazil")), Region::Latam);
    }

    #[test]
    fn missing_location_is_other() {
        assert_eq!(classify_region(None), Region::Other);
        assert_eq!(classify_region(Some("   ")), Region::Other);
    }

    #[test]
    fn staff_beats_senior_in_cascade() {
        assert_eq!(
            classify_seniority("Senior Staff Product Manager"),
            Seniority::Staff
        );
    }

    #[test]
    fn leadership_beats_staff() {
        assert_eq!(
            classify_seniority("Director of Product, Principal Platforms"),
            Seniority::Leadership
        );
    }

    #[test]
    fn plain_title_defaults_to_mid() {
        assert_eq!(classify_seniority("Product Manager"), Seniority::Mid);
    }

    #[test]
    fn exclude_list_takes_precedence() {
        assert!(!is_relevant_role("Product Marketing Manager"));
        assert!(!is_relevant_role("Senior Software Engineer, Product"));
        assert!(is_relevant_role("Senior Product Manager"));
        assert!(is_relevant_role("Group Product Manager"));
    }

    #[test]
    fn africa_checked_before_generic_gazetteers() {
        assert_eq!(
            classify_continent(Some("Cape Town, South Africa"), Region::Other),
            Continent::Africa
        );
    }

    #[test]
    fn continent_falls_back_to_region() {
        assert_eq!(
            classify_continent(None, Region::Apac),
            Continent::Asia
        );
        assert_eq!(
            classify_continent(Some("somewhere"), Region::Us),
            Continent::NorthAmerica
        );
    }

    #[test]
    fn remote_continent_checked_first() {
        assert_eq!(
            classify_continent(Some("Remote - Sydney"), Region::Apac),
            Continent::Remote
        );
    }

    #[test]
    fn oceania_not_swallowed_by_asia() {
        assert_eq!(
            classify_continent(Some("Sydney, Australia"), Region::Apac),
            Continent::Oceania
        );
    }

    #[test]
    fn country_from_city() {
        assert_eq!(
            extract_country(Some("Berlin office"), Region::Eu),
            Some("Germany".to_string())
        );
        assert_eq!(
            extract_country(Some("HQ"), Region::Us),
            Some("United States".to_string())
        );
        assert_eq!(extract_country(Some("HQ"), Region::Other), None);
    }

    #[test]
    fn epoch_seconds_and_millis() {
        // 2021-01-01T00:00:00Z
        let secs = serde_json::json!(1_609_459_200);
        let millis = serde_json::json!(1_609_459_200_000i64);
        let expected = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert_eq!(normalize_date(&secs), Some(expected));
        assert_eq!(normalize_date(&millis), Some(expected));
    }

    #[test]
    fn iso_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        for raw in [
            "2024-03-05",
            "2024/03/05",
            "2024-03-05T10:30:00Z",
            "2024-03-05T10:30:00+02:00",
            "2024-03-05T10:30:00+0200",
        ] {
            assert_eq!(
                normalize_date(&serde_json::json!(raw)),
                Some(expected),
                "failed for {raw}"
            );
        }
    }

    #[test]
    fn garbage_dates_yield_none() {
        assert_eq!(normalize_date(&serde_json::json!("yesterday")), None);
        assert_eq!(normalize_date(&serde_json::json!(null)), None);
        assert_eq!(normalize_date(&serde_json::json!(true)), None);
    }
}
