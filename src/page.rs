//! Page Model (C3) — parsed representation of a fetched response
//!
//! `Page` is a value object: `{url, status, links, forms, cookies, headers, body}`.
//! Every element carries enough information to be mutated and re-submitted by a
//! module (forms have fields, cookies have name/value/scope). The orchestrator
//! deep-copies a page (`Page: Clone`) before handing it to a module so concurrent
//! modules cannot corrupt each other's view (spec §3).

use std::collections::HashMap;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// An element class a module can target (spec §3, §4.4, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElementKind {
    Link,
    Form,
    Cookie,
    Header,
    Body,
    Path,
    Server,
}

/// A discovered hyperlink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub text: String,
}

/// A single form field, mutable and re-submittable by a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
    pub field_type: String,
}

/// A discovered HTML form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub action: String,
    pub method: String,
    pub fields: Vec<FormField>,
}

/// A cookie, scoped to the page it was observed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub scope: String,
}

/// A single response header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// The parsed representation of a fetched page. Cheap to clone relative to
/// the cost of re-fetching, expensive enough that the work queues only ever
/// hold `Page` after it has actually been parsed (spec §9: "pages would
/// otherwise exhaust memory" is why URLs and Pages live in separate queues).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub status: u16,
    pub links: Vec<Link>,
    pub forms: Vec<Form>,
    pub cookies: Vec<Cookie>,
    pub headers: Vec<Header>,
    pub body: String,
}

impl Page {
    /// The page-parser collaborator (spec §6: `Page.from_http_response`).
    /// A deliberately small HTML scan: link and form extraction via
    /// `scraper`, headers/cookies passed through from the transport layer.
    pub fn from_http_response(
        url: &str,
        status: u16,
        headers: &[Header],
        set_cookie_values: &[String],
        body: String,
    ) -> Self {
        let document = Html::parse_document(&body);
        let links = extract_links(&document, url);
        let forms = extract_forms(&document);
        let cookies = parse_set_cookie_headers(set_cookie_values, url);

        Self {
            url: url.to_string(),
            status,
            links,
            forms,
            cookies,
            headers: headers.to_vec(),
            body,
        }
    }

    /// Whether this page has at least one element of the given class,
    /// used by the module dispatcher's applicability rule (spec §4.4).
    pub fn has_element(&self, kind: ElementKind) -> bool {
        match kind {
            ElementKind::Link => !self.links.is_empty(),
            ElementKind::Form => !self.forms.is_empty(),
            ElementKind::Cookie => !self.cookies.is_empty(),
            ElementKind::Header => !self.headers.is_empty(),
            // BODY, PATH, SERVER are always-applicable classes (spec §4.4).
            ElementKind::Body | ElementKind::Path | ElementKind::Server => true,
        }
    }
}

fn extract_links(document: &Html, base_url: &str) -> Vec<Link> {
    let selector = Selector::parse("a[href]").expect("static selector is valid");
    let base = url::Url::parse(base_url).ok();

    document
        .select(&selector)
        .filter_map(|el| {
            let href = el.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            let resolved = base
                .as_ref()
                .and_then(|b| b.join(href).ok())
                .map(|u| u.to_string())
                .unwrap_or_else(|| href.to_string());
            let text = el.text().collect::<String>().trim().to_string();
            Some(Link {
                url: resolved,
                text,
            })
        })
        .collect()
}

fn extract_forms(document: &Html) -> Vec<Form> {
    let form_selector = Selector::parse("form").expect("static selector is valid");
    let field_selector =
        Selector::parse("input, textarea, select").expect("static selector is valid");

    document
        .select(&form_selector)
        .map(|form_el| {
            let action = form_el.value().attr("action").unwrap_or("").to_string();
            let method = form_el
                .value()
                .attr("method")
                .unwrap_or("get")
                .to_lowercase();

            let fields = form_el
                .select(&field_selector)
                .filter_map(|field_el| {
                    let name = field_el.value().attr("name")?.to_string();
                    let value = field_el.value().attr("value").unwrap_or("").to_string();
                    let field_type = field_el
                        .value()
                        .attr("type")
                        .unwrap_or_else(|| field_el.value().name())
                        .to_string();
                    Some(FormField {
                        name,
                        value,
                        field_type,
                    })
                })
                .collect();

            Form {
                action,
                method,
                fields,
            }
        })
        .collect()
}

fn parse_set_cookie_headers(values: &[String], scope: &str) -> Vec<Cookie> {
    let mut cookies = HashMap::new();
    for raw in values {
        // A Set-Cookie header's first segment is the name=value pair; later
        // segments (Path=, Domain=, ...) are attributes we don't model.
        if let Some(pair) = raw.split(';').next() {
            if let Some((name, value)) = pair.split_once('=') {
                cookies.insert(
                    name.trim().to_string(),
                    Cookie {
                        name: name.trim().to_string(),
                        value: value.trim().to_string(),
                        scope: scope.to_string(),
                    },
                );
            }
        }
    }
    cookies.into_values().collect()
}
