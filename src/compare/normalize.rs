use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Price given to an offer whose fare is missing or unreadable, so it sorts last.
pub const PRICE_SENTINEL: f64 = 99999.0;

/// ETA (minutes) given to an offer whose ETA is missing or unreadable.
pub const ETA_SENTINEL: u32 = 999;

/// Whatever the automation agent handed back for one provider, untouched.
pub type RawProviderResult = Value;

/// The three ride-hailing apps we compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum App {
    Uber,
    Ola,
    Rapido,
}

impl App {
    /// Fetch order, and the priority order used when reading a model reply.
    pub const ALL: [App; 3] = [App::Uber, App::Ola, App::Rapido];

    pub fn name(&self) -> &'static str {
        match self {
            App::Uber => "Uber",
            App::Ola => "Ola",
            App::Rapido => "Rapido",
        }
    }

    /// Field holding the service label in this app's price payload.
    pub fn label_field(&self) -> &'static str {
        match self {
            App::Uber | App::Ola => "service",
            App::Rapido => "ride_type",
        }
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Cab,
    Auto,
    Bike,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 3] = [VehicleClass::Cab, VehicleClass::Auto, VehicleClass::Bike];

    /// Maps the numeric menu choice (`1`, `2`, `3`). Anything else is a cab.
    pub fn from_choice(choice: &str) -> Self {
        match choice.trim() {
            "2" => VehicleClass::Auto,
            "3" => VehicleClass::Bike,
            _ => VehicleClass::Cab,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::Cab => "cab",
            VehicleClass::Auto => "auto",
            VehicleClass::Bike => "bike",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keywords matched (case-insensitive substring) against each provider's service
/// label to decide which vehicle class an offer belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordTable {
    pub cab: Vec<String>,
    pub auto: Vec<String>,
    pub bike: Vec<String>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        let words = |list: &[&str]| -> Vec<String> { list.iter().map(|w| w.to_string()).collect() };
        Self {
            cab: words(&["cab", "mini", "prime", "sedan", "economy", "xl", "go"]),
            auto: words(&["auto"]),
            bike: words(&["bike", "moto"]),
        }
    }
}

impl KeywordTable {
    pub fn keywords(&self, class: VehicleClass) -> &[String] {
        match class {
            VehicleClass::Cab => &self.cab,
            VehicleClass::Auto => &self.auto,
            VehicleClass::Bike => &self.bike,
        }
    }

    pub fn matches(&self, class: VehicleClass, label: &str) -> bool {
        let label = label.to_lowercase();
        self.keywords(class)
            .iter()
            .any(|keyword| label.contains(&keyword.to_lowercase()))
    }
}

/// One comparable offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideOption {
    pub app: App,
    pub price: f64,
    pub eta: u32,
}

/// Shape of a raw provider result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProviderPayload<'a> {
    /// A bare list of offers.
    List(&'a [Value]),
    /// A task result object carrying the list under `json`.
    Wrapped(&'a [Value]),
    Unrecognized,
}

impl<'a> ProviderPayload<'a> {
    pub fn classify(raw: &'a Value) -> Self {
        match raw {
            Value::Array(items) => ProviderPayload::List(items),
            Value::Object(map) => match map.get("json") {
                Some(Value::Array(items)) => ProviderPayload::Wrapped(items),
                _ => ProviderPayload::Unrecognized,
            },
            _ => ProviderPayload::Unrecognized,
        }
    }

    /// Offers carried by the payload. `accept_wrapped` is false for providers whose
    /// adapter already unwraps the task result.
    pub fn entries(&self, accept_wrapped: bool) -> &'a [Value] {
        match *self {
            ProviderPayload::List(items) => items,
            ProviderPayload::Wrapped(items) if accept_wrapped => items,
            ProviderPayload::Wrapped(_) | ProviderPayload::Unrecognized => &[],
        }
    }
}

/// Turns the three raw provider results into one filtered list of [`RideOption`]s.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    keywords: KeywordTable,
}

impl Normalizer {
    pub fn new(keywords: KeywordTable) -> Self {
        Self { keywords }
    }

    /// Options are ordered Uber, Ola, Rapido, each in payload order.
    pub fn normalize(
        &self,
        uber: &Value,
        ola: &Value,
        rapido: &Value,
        class: VehicleClass,
    ) -> Vec<RideOption> {
        let mut options = Vec::new();

        // Uber's adapter returns the parsed list itself; anything else is an error marker.
        for item in offers(ProviderPayload::classify(uber).entries(false)) {
            if self.label_matches(App::Uber, item, class) {
                options.push(plain_option(App::Uber, item));
            }
        }

        for item in offers(ProviderPayload::classify(ola).entries(true)) {
            if self.label_matches(App::Ola, item, class) {
                options.push(plain_option(App::Ola, item));
            }
        }

        for item in offers(ProviderPayload::classify(rapido).entries(true)) {
            if self.label_matches(App::Rapido, item, class) {
                options.push(RideOption {
                    app: App::Rapido,
                    price: rapido_price(item),
                    eta: rapido_eta(item),
                });
            }
        }

        options
    }

    fn label_matches(&self, app: App, item: &Map<String, Value>, class: VehicleClass) -> bool {
        let label = item.get(app.label_field()).map(text).unwrap_or_default();
        self.keywords.matches(class, &label)
    }
}

fn offers(entries: &[Value]) -> impl Iterator<Item = &Map<String, Value>> {
    entries.iter().filter_map(Value::as_object)
}

fn plain_option(app: App, item: &Map<String, Value>) -> RideOption {
    RideOption {
        app,
        price: number_field(item.get("price")).unwrap_or(PRICE_SENTINEL),
        eta: eta_field(item.get("eta")).unwrap_or(ETA_SENTINEL),
    }
}

/// Text form of a JSON value; strings are taken without quotes, null is empty.
pub(crate) fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Null, false, zero and empty values count as absent when a field falls through
/// to an alternative.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn number_field(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn eta_field(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn rapido_price(item: &Map<String, Value>) -> f64 {
    item.get("estimated_fare")
        .map(text)
        .and_then(|raw| parse_fare(&raw))
        .unwrap_or(PRICE_SENTINEL)
}

/// `"₹245.50"` → `245.5`. Only the rupee glyph and surrounding whitespace are removed.
pub fn parse_fare(raw: &str) -> Option<f64> {
    raw.replace('₹', "")
        .trim()
        .chars()
        .map(|c| ascii_digit(c).unwrap_or(c))
        .collect::<String>()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

fn rapido_eta(item: &Map<String, Value>) -> u32 {
    let raw = ["eta", "time"]
        .iter()
        .filter_map(|key| item.get(*key))
        .find(|value| is_truthy(value))
        .map(text)
        .unwrap_or_default();

    parse_eta_text(&raw).unwrap_or(ETA_SENTINEL)
}

/// `"5 mins"` → `5`. Every non-digit character is dropped before parsing.
pub fn parse_eta_text(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter_map(ascii_digit).collect();
    digits.parse::<u32>().ok()
}

/// Zero of each decimal digit block apps are known to render.
const DIGIT_ZEROS: [u32; 12] = [
    0x0660, // Arabic-Indic
    0x06F0, // Extended Arabic-Indic
    0x0966, // Devanagari
    0x09E6, // Bengali
    0x0A66, // Gurmukhi
    0x0AE6, // Gujarati
    0x0B66, // Oriya
    0x0BE6, // Tamil
    0x0C66, // Telugu
    0x0CE6, // Kannada
    0x0D66, // Malayalam
    0xFF10, // Fullwidth
];

/// The ASCII form of a decimal digit in any supported script.
fn ascii_digit(c: char) -> Option<char> {
    if c.is_ascii_digit() {
        return Some(c);
    }
    let code = c as u32;
    DIGIT_ZEROS
        .iter()
        .find(|zero| (**zero..**zero + 10).contains(&code))
        .and_then(|zero| char::from_digit(code - zero, 10))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(uber: Value, ola: Value, rapido: Value, class: VehicleClass) -> Vec<RideOption> {
        Normalizer::default().normalize(&uber, &ola, &rapido, class)
    }

    #[test]
    fn test_native_script_digits() {
        assert_eq!(parse_eta_text("५ मिनट"), Some(5));
        assert_eq!(parse_eta_text("١٢ min"), Some(12));
        assert_eq!(parse_fare("₹२४५"), Some(245.0));
        assert_eq!(parse_fare("₹ ১২০.৫"), Some(120.5));
        assert_eq!(parse_fare("२४५ rupees"), None);
    }

    #[test]
    fn test_rapido_fare_and_eta_parsing() {
        assert_eq!(parse_fare("₹245.50"), Some(245.50));
        assert_eq!(parse_fare(" ₹ 110 "), Some(110.0));
        assert_eq!(parse_fare("no-digits"), None);
        assert_eq!(parse_eta_text("5 mins"), Some(5));
        assert_eq!(parse_eta_text("soon"), None);

        let options = normalize(
            Value::Null,
            Value::Null,
            json!([
                {"ride_type": "Bike", "estimated_fare": "₹245.50", "eta": "5 mins"},
                {"ride_type": "Bike Lite", "estimated_fare": "no-digits", "time": "a while"}
            ]),
            VehicleClass::Bike,
        );

        assert_eq!(
            options,
            vec![
                RideOption { app: App::Rapido, price: 245.50, eta: 5 },
                RideOption { app: App::Rapido, price: PRICE_SENTINEL, eta: ETA_SENTINEL },
            ]
        );
    }

    #[test]
    fn test_rapido_eta_falls_back_to_time() {
        let options = normalize(
            Value::Null,
            Value::Null,
            json!([
                {"ride_type": "Auto", "estimated_fare": 90, "eta": "", "time": "7 min"},
                {"ride_type": "Auto", "estimated_fare": "₹95", "eta": null, "time": 4}
            ]),
            VehicleClass::Auto,
        );

        assert_eq!(options[0].eta, 7);
        assert_eq!(options[0].price, 90.0);
        assert_eq!(options[1].eta, 4);
    }

    #[test]
    fn test_ola_wrapped_and_bare_lists_match() {
        let offers = json!([
            {"service": "Mini", "price": 200, "eta": 7},
            {"service": "Auto", "price": 120, "eta": 6},
            "garbage"
        ]);
        let wrapped = json!({"success": true, "json": offers.clone(), "raw_reason": "[...]"});

        for class in VehicleClass::ALL {
            assert_eq!(
                normalize(Value::Null, offers.clone(), Value::Null, class),
                normalize(Value::Null, wrapped.clone(), Value::Null, class),
            );
        }
    }

    #[test]
    fn test_uber_requires_a_bare_list() {
        let error_marker = json!({"error": "No JSON extracted", "reason": "could not read screen"});
        assert!(normalize(error_marker, Value::Null, Value::Null, VehicleClass::Cab).is_empty());

        let wrapped = json!({"json": [{"service": "Uber Go", "price": 300, "eta": 5}]});
        assert!(normalize(wrapped, Value::Null, Value::Null, VehicleClass::Cab).is_empty());
    }

    #[test]
    fn test_missing_fields_become_sentinels() {
        let options = normalize(
            json!([
                {"service": "Uber Go"},
                {"service": "Premier Sedan", "price": "325.14", "eta": 2.9},
                {"service": "XL", "price": null, "eta": -3}
            ]),
            Value::Null,
            Value::Null,
            VehicleClass::Cab,
        );

        assert_eq!(options.len(), 3);
        assert_eq!((options[0].price, options[0].eta), (PRICE_SENTINEL, ETA_SENTINEL));
        assert_eq!((options[1].price, options[1].eta), (325.14, 2));
        assert_eq!((options[2].price, options[2].eta), (PRICE_SENTINEL, ETA_SENTINEL));
    }

    #[test]
    fn test_only_matching_labels_survive() {
        let uber = json!([
            {"service": "Uber Go", "price": 325.14, "eta": 2},
            {"service": "Bike Saver", "price": 224.41, "eta": 4},
            {"service": "Uber AUTO", "price": 150, "eta": 3}
        ]);
        let ola = json!({"json": [{"service": "Prime Sedan", "price": 400, "eta": 9}]});
        let rapido = json!([{"ride_type": "Moto", "estimated_fare": "₹80", "eta": "3 mins"}]);

        assert_eq!(
            normalize(uber.clone(), ola.clone(), rapido.clone(), VehicleClass::Cab),
            vec![
                RideOption { app: App::Uber, price: 325.14, eta: 2 },
                RideOption { app: App::Ola, price: 400.0, eta: 9 },
            ]
        );
        assert_eq!(
            normalize(uber.clone(), ola.clone(), rapido.clone(), VehicleClass::Auto),
            vec![RideOption { app: App::Uber, price: 150.0, eta: 3 }]
        );
        assert_eq!(
            normalize(uber, ola, rapido, VehicleClass::Bike),
            vec![
                RideOption { app: App::Uber, price: 224.41, eta: 4 },
                RideOption { app: App::Rapido, price: 80.0, eta: 3 },
            ]
        );
    }

    #[test]
    fn test_custom_keyword_table() {
        let table = KeywordTable {
            cab: vec!["premier".to_string()],
            auto: vec![],
            bike: vec![],
        };
        let uber = json!([
            {"service": "Uber Go", "price": 300, "eta": 5},
            {"service": "Premier", "price": 420, "eta": 4}
        ]);

        let options = Normalizer::new(table).normalize(&uber, &Value::Null, &Value::Null, VehicleClass::Cab);
        assert_eq!(options, vec![RideOption { app: App::Uber, price: 420.0, eta: 4 }]);
        assert!(Normalizer::default()
            .normalize(&uber, &Value::Null, &Value::Null, VehicleClass::Auto)
            .is_empty());
    }

    #[test]
    fn test_vehicle_choice_defaults_to_cab() {
        assert_eq!(VehicleClass::from_choice("1"), VehicleClass::Cab);
        assert_eq!(VehicleClass::from_choice(" 2\n"), VehicleClass::Auto);
        assert_eq!(VehicleClass::from_choice("3"), VehicleClass::Bike);
        assert_eq!(VehicleClass::from_choice("bike"), VehicleClass::Cab);
        assert_eq!(VehicleClass::from_choice(""), VehicleClass::Cab);
    }
}
