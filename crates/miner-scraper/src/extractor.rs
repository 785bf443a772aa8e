use crate::error::{ExtractionError, Result, ScrapeError};
use miner_core::{extract_number, parse_price, strip_diacritics, ListingRecord, UNKNOWN_LOCATION};
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// CSS selectors for a listing card, as written in source definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSelectorSpec {
    /// One element per listing card
    pub card: String,
    /// Block holding the labeled attribute items
    pub labels: String,
    /// One attribute item inside `labels`
    pub label_item: String,
    /// Element inside an item carrying the `aria-label` text
    pub label_text: String,
    /// Price text
    pub price: String,
    /// `"<city>, <neighborhood> | <extra>"` text
    pub location: String,
    /// Listing title
    pub title: String,
    /// Anchor whose `href` is the listing link
    pub link: String,
}

impl CardSelectorSpec {
    /// Layout of OLX ad cards.
    pub fn olx() -> Self {
        Self {
            card: r#"section[data-ds-component="DS-AdCard"]"#.to_string(),
            labels: ".olx-ad-card__labels-items".to_string(),
            label_item: "li".to_string(),
            label_text: "span[aria-label]".to_string(),
            price: ".olx-ad-card__price".to_string(),
            location: ".olx-ad-card__location".to_string(),
            title: "h2".to_string(),
            link: "a[href]".to_string(),
        }
    }
}

/// Compiled card selectors. Construction fails on any invalid selector,
/// so extraction itself never has to.
#[derive(Debug, Clone)]
pub struct CardSelectors {
    card: Selector,
    labels: Selector,
    label_item: Selector,
    label_text: Selector,
    price: Selector,
    location: Selector,
    title: Selector,
    link: Selector,
}

impl CardSelectors {
    /// Compile every selector in `spec`.
    pub fn compile(spec: &CardSelectorSpec) -> Result<Self> {
        Ok(Self {
            card: compile_selector(&spec.card)?,
            labels: compile_selector(&spec.labels)?,
            label_item: compile_selector(&spec.label_item)?,
            label_text: compile_selector(&spec.label_text)?,
            price: compile_selector(&spec.price)?,
            location: compile_selector(&spec.location)?,
            title: compile_selector(&spec.title)?,
            link: compile_selector(&spec.link)?,
        })
    }

    /// Compiled [`CardSelectorSpec::olx`].
    pub fn olx() -> Result<Self> {
        Self::compile(&CardSelectorSpec::olx())
    }

    /// Selector matching each card on a results page.
    pub fn card(&self) -> &Selector {
        &self.card
    }
}

fn compile_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Counts read from a card's labeled attribute items.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct LabelCounts {
    bedrooms: u32,
    parking: u32,
    bathrooms: u32,
    area: u32,
}

/// Turns one ad card into a [`ListingRecord`].
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    selectors: CardSelectors,
    base_url: Url,
}

impl FieldExtractor {
    /// Extractor resolving relative links against `base_url`.
    pub fn new(selectors: CardSelectors, base_url: Url) -> Self {
        Self {
            selectors,
            base_url,
        }
    }

    /// Selectors this extractor reads cards with.
    pub fn selectors(&self) -> &CardSelectors {
        &self.selectors
    }

    /// Extract the card at position `index` on its page.
    ///
    /// Title and link are required; every other field falls back to a default.
    pub fn extract(
        &self,
        card: ElementRef<'_>,
        index: usize,
        kind: &str,
    ) -> std::result::Result<ListingRecord, ExtractionError> {
        let counts = self.read_labels(card);

        let price_text = card
            .select(&self.selectors.price)
            .next()
            .map_or_else(|| "0".to_string(), element_text);
        let price = parse_price(&price_text).ok_or_else(|| ExtractionError::InvalidPrice {
            card: index,
            text: price_text.clone(),
        })?;

        let location_text = card
            .select(&self.selectors.location)
            .next()
            .map_or_else(|| UNKNOWN_LOCATION.to_string(), element_text);
        let (city, neighborhood) = split_location(&location_text);

        let title = card
            .select(&self.selectors.title)
            .next()
            .map(element_text)
            .ok_or(ExtractionError::MissingElement {
                card: index,
                element: "title",
            })?;

        let href = card
            .select(&self.selectors.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or(ExtractionError::MissingElement {
                card: index,
                element: "link",
            })?;

        Ok(ListingRecord {
            title: strip_diacritics(&title),
            kind: kind.to_string(),
            price,
            city: strip_diacritics(city),
            neighborhood: strip_diacritics(neighborhood),
            bedroom_count: counts.bedrooms,
            parking_count: counts.parking,
            bathroom_count: counts.bathrooms,
            area_sqm: counts.area,
            link: self.resolve_link(href),
        })
    }

    fn read_labels(&self, card: ElementRef<'_>) -> LabelCounts {
        let mut counts = LabelCounts::default();

        let Some(block) = card.select(&self.selectors.labels).next() else {
            return counts;
        };

        for item in block.select(&self.selectors.label_item) {
            let label = item
                .select(&self.selectors.label_text)
                .next()
                .and_then(|span| span.value().attr("aria-label"))
                .map_or_else(|| element_text(item), str::to_string)
                .to_lowercase();
            let value = extract_number(&label);

            if label.contains("quarto") {
                counts.bedrooms = value;
            } else if label.contains("metros quadrados") {
                counts.area = value;
            } else if label.contains("vaga") {
                counts.parking = value;
            } else if label.contains("banheiro") {
                counts.bathrooms = value;
            } else {
                tracing::trace!(label = %label, "ignoring unrecognized card label");
            }
        }

        counts
    }

    fn resolve_link(&self, href: &str) -> String {
        match self.base_url.join(href) {
            Ok(url) => url.to_string(),
            Err(_) => href.to_string(),
        }
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Split `"<city>, <neighborhood> | <extra>"`. Text without a comma yields
/// the unknown-location sentinel for both parts.
fn split_location(text: &str) -> (&str, &str) {
    let mut parts = text.split(',');
    match (parts.next(), parts.next()) {
        (Some(city), Some(rest)) => {
            let neighborhood = rest.split('|').next().unwrap_or(rest);
            (city.trim(), neighborhood.trim())
        }
        _ => (UNKNOWN_LOCATION, UNKNOWN_LOCATION),
    }
}
