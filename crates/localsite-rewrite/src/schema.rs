//! JSON-LD structured data.
//!
//! Builds a schema.org `@graph` for each page and keeps it in a single
//! `<script id="schema-ld">` block.

use localsite_core::{Config, name_from_slug};
use serde_json::{Map, Value, json};

use crate::{
    engine::{PageContext, Rewriter},
    error::Result,
    faq::FAQ_SCRIPT_ID,
    markup,
};

/// Id of the page's main JSON-LD script.
pub const SCHEMA_SCRIPT_ID: &str = "schema-ld";

const MIN_QUESTION_CHARS: usize = 6;
const MIN_ANSWER_CHARS: usize = 10;

/// Render a JSON-LD `<script>` element.
///
/// `</` is escaped so no string in the payload can close the element.
pub fn json_ld_script(id: &str, value: &Value) -> Result<String> {
    let json = serde_json::to_string(value)?.replace("</", r"<\/");
    Ok(format!(
        r#"<script id="{id}" type="application/ld+json">{json}</script>"#
    ))
}

/// A schema.org `Question` with its accepted answer.
#[must_use]
pub fn question(name: &str, answer: &str) -> Value {
    json!({
        "@type": "Question",
        "name": name,
        "acceptedAnswer": { "@type": "Answer", "text": answer },
    })
}

fn insert_opt(node: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        node.insert(key.to_string(), Value::from(value));
    }
}

/// Injects or replaces the page's JSON-LD graph.
#[derive(Debug, Clone)]
pub struct SchemaRewriter {
    config: Config,
}

impl SchemaRewriter {
    /// Create a schema rewriter.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn base(&self) -> &str {
        self.config.base_url()
    }

    fn business_id(&self) -> String {
        format!("{}/#business", self.base())
    }

    fn absolute(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            self.config.url_for(path)
        }
    }

    fn address(&self, locality: Option<&str>) -> Value {
        let mut node = Map::new();
        node.insert("@type".into(), json!("PostalAddress"));
        insert_opt(&mut node, "addressLocality", locality);
        node.insert("addressRegion".into(), json!(self.config.site.region));
        node.insert("addressCountry".into(), json!(self.config.site.country));
        Value::Object(node)
    }

    /// City name for a city page: configured name, else derived from the slug.
    fn city_name(&self, slug: &str) -> String {
        self.config.city(slug).map_or_else(
            || name_from_slug(slug, &self.config.cities.slug_suffix),
            |city| city.name,
        )
    }

    fn business(&self, is_home: bool) -> Value {
        let site = &self.config.site;
        let schema = &self.config.schema;

        let mut node = Map::new();
        node.insert("@type".into(), json!(schema.business_type));
        node.insert("@id".into(), json!(self.business_id()));
        node.insert("name".into(), json!(site.name));
        node.insert("url".into(), json!(format!("{}/", self.base())));
        insert_opt(&mut node, "telephone", site.telephone.as_deref());
        insert_opt(&mut node, "email", site.email.as_deref());

        if let Some(telephone) = &site.telephone {
            node.insert(
                "contactPoint".into(),
                json!([{
                    "@type": "ContactPoint",
                    "telephone": telephone,
                    "contactType": "sales",
                    "areaServed": site.country,
                    "availableLanguage": ["en"],
                }]),
            );
        }

        if is_home {
            insert_opt(&mut node, "priceRange", schema.price_range.as_deref());
            if let Some(image) = &schema.image {
                node.insert("image".into(), json!(self.absolute(image)));
            }
            node.insert("address".into(), self.address(None));

            if !schema.hours.is_empty() {
                let hours: Vec<Value> = schema
                    .hours
                    .iter()
                    .map(|h| {
                        json!({
                            "@type": "OpeningHoursSpecification",
                            "dayOfWeek": h.days,
                            "opens": h.opens,
                            "closes": h.closes,
                        })
                    })
                    .collect();
                node.insert("openingHoursSpecification".into(), Value::Array(hours));
            }

            if let Some(geo) = &schema.geo {
                node.insert(
                    "areaServed".into(),
                    json!({
                        "@type": "GeoCircle",
                        "geoMidpoint": {
                            "@type": "GeoCoordinates",
                            "latitude": geo.latitude,
                            "longitude": geo.longitude,
                        },
                        "geoRadius": geo.radius_m,
                    }),
                );
            }
        }

        Value::Object(node)
    }

    fn website(&self) -> Value {
        json!({
            "@type": "WebSite",
            "@id": format!("{}/#website", self.base()),
            "url": format!("{}/", self.base()),
            "name": self.config.site.name,
            "publisher": { "@id": self.business_id() },
        })
    }

    fn webpage(&self, page: &PageContext, html: &str) -> Value {
        let mut node = Map::new();
        node.insert("@type".into(), json!("WebPage"));
        node.insert("@id".into(), json!(format!("{}#webpage", page.url)));
        node.insert("url".into(), json!(page.url));
        node.insert(
            "name".into(),
            json!(markup::title(html).unwrap_or_else(|| self.config.site.name.clone())),
        );
        insert_opt(
            &mut node,
            "description",
            markup::meta_description(html).as_deref(),
        );
        node.insert(
            "isPartOf".into(),
            json!({ "@id": format!("{}/#website", self.base()) }),
        );
        node.insert("about".into(), json!({ "@id": self.business_id() }));
        Value::Object(node)
    }

    fn service(&self, page: &PageContext, city: Option<&str>) -> Value {
        let schema = &self.config.schema;
        let region = &self.config.site.region;
        let service_name = schema
            .service_name
            .as_deref()
            .unwrap_or(&self.config.site.name);

        let (id, name, area) = match city {
            Some(city) => (
                format!("{}#service", page.url),
                format!("{service_name} in {city}, {region}"),
                json!({
                    "@type": "City",
                    "name": city,
                    "address": self.address(Some(city)),
                }),
            ),
            None => (
                format!("{}/#service", self.base()),
                service_name.to_string(),
                json!({
                    "@type": "AdministrativeArea",
                    "name": self.config.region_name(),
                    "address": self.address(None),
                }),
            ),
        };

        let mut node = Map::new();
        node.insert("@type".into(), json!("Service"));
        node.insert("@id".into(), json!(id));
        node.insert("name".into(), json!(name));
        insert_opt(&mut node, "serviceType", schema.service_type.as_deref());
        node.insert("provider".into(), json!({ "@id": self.business_id() }));
        node.insert("url".into(), json!(page.url));
        node.insert("areaServed".into(), area);
        Value::Object(node)
    }

    fn breadcrumbs(&self, page: &PageContext, city: &str) -> Value {
        let base = self.base();
        json!({
            "@type": "BreadcrumbList",
            "@id": format!("{}#breadcrumbs", page.url),
            "itemListElement": [
                { "@type": "ListItem", "position": 1, "name": "Home", "item": format!("{base}/") },
                {
                    "@type": "ListItem",
                    "position": 2,
                    "name": "Service Areas",
                    "item": format!("{base}/#service-areas"),
                },
                {
                    "@type": "ListItem",
                    "position": 3,
                    "name": format!("{city}, {}", self.config.site.region),
                    "item": page.url,
                },
            ],
        })
    }

    fn faq_page(page: &PageContext, html: &str) -> Option<Value> {
        let questions: Vec<Value> = markup::details_pairs(html)
            .iter()
            .filter(|(q, a)| {
                q.chars().count() >= MIN_QUESTION_CHARS && a.chars().count() >= MIN_ANSWER_CHARS
            })
            .map(|(q, a)| question(q, a))
            .collect();

        (!questions.is_empty()).then(|| {
            json!({
                "@type": "FAQPage",
                "@id": format!("{}#faq", page.url),
                "mainEntity": questions,
            })
        })
    }

    /// Graph nodes for one page.
    ///
    /// A page that already carries a dedicated FAQ block gets no `FAQPage`
    /// node here.
    #[must_use]
    pub fn graph(&self, page: &PageContext, html: &str) -> Vec<Value> {
        let city = page.city_slug.as_deref().map(|slug| self.city_name(slug));

        let mut graph = vec![
            self.business(page.is_home),
            self.website(),
            self.webpage(page, html),
            self.service(page, city.as_deref()),
        ];

        if let Some(city) = &city {
            graph.push(self.breadcrumbs(page, city));
        }

        if markup::find_script_by_id(html, FAQ_SCRIPT_ID).is_none() {
            graph.extend(Self::faq_page(page, html));
        }

        graph
    }
}

impl Rewriter for SchemaRewriter {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn rewrite(&self, page: &PageContext, html: &str) -> Result<Option<String>> {
        let doc = json!({
            "@context": "https://schema.org",
            "@graph": self.graph(page, html),
        });
        let block = json_ld_script(SCHEMA_SCRIPT_ID, &doc)?;
        let out = markup::upsert_script(html, SCHEMA_SCRIPT_ID, &block);
        Ok((out != html).then_some(out))
    }
}
