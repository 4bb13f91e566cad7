use async_trait::async_trait;

use tenax_engine::backend::{Backend, BackendError, NavigationResult};
use tenax_engine::config::schema::{InterstitialConfig, SuppressorConfig};
use tenax_engine::locator::Locator;
use tenax_engine::protocol::{OverlayInfo, Rect};
use tenax_engine::signature::{ObstructionSignature, Severity};
use tenax_engine::suppressor::Suppressor;

/// One element of the fake document. `matches` lists every selector the
/// element would satisfy, so the mock never needs a CSS engine.
#[derive(Debug, Clone, PartialEq)]
struct FakeElement {
    matches: Vec<&'static str>,
    inline_z: Option<i64>,
    computed_z: Option<i64>,
    visible: bool,
    hidden_important: bool,
    detached: bool,
}

impl FakeElement {
    fn new(matches: Vec<&'static str>) -> Self {
        Self {
            matches,
            inline_z: None,
            computed_z: None,
            visible: true,
            hidden_important: false,
            detached: false,
        }
    }

    fn with_inline_z(mut self, z: i64) -> Self {
        self.inline_z = Some(z);
        self.computed_z = Some(z);
        self
    }

    fn with_computed_z_only(mut self, z: i64) -> Self {
        self.computed_z = Some(z);
        self
    }
}

/// A document model that answers the suppression capability calls against
/// a vector of fake elements and records navigations and scripts.
#[derive(Debug, Default)]
struct DomBackend {
    elements: Vec<FakeElement>,
    url: String,
    navigations: Vec<String>,
    scripts: Vec<String>,
}

impl DomBackend {
    fn with_elements(elements: Vec<FakeElement>) -> Self {
        Self {
            elements,
            url: "https://shop.test/products".to_string(),
            ..Self::default()
        }
    }

    fn attached_matching(&self, selector: &str) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, el)| !el.detached && el.matches.contains(&selector))
            .map(|(i, _)| i)
            .collect()
    }
}

#[async_trait]
impl Backend for DomBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
    async fn close(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
    async fn is_ready(&self) -> bool {
        true
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        self.navigations.push(url.to_string());
        self.url = url.to_string();
        Ok(NavigationResult {
            url: url.to_string(),
            title: String::new(),
            status: 200,
        })
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        Ok(self.url.clone())
    }

    async fn count(&mut self, target: &Locator) -> Result<usize, BackendError> {
        Ok(self.attached_matching(target.as_str()).len())
    }

    async fn is_visible(&mut self, target: &Locator) -> Result<bool, BackendError> {
        Ok(self
            .attached_matching(target.as_str())
            .first()
            .map(|&i| self.elements[i].visible && !self.elements[i].hidden_important)
            .unwrap_or(false))
    }

    async fn bounding_box(&mut self, _target: &Locator) -> Result<Option<Rect>, BackendError> {
        Ok(None)
    }

    async fn is_disabled(&mut self, _target: &Locator) -> Result<bool, BackendError> {
        Ok(false)
    }

    async fn click(&mut self, _target: &Locator) -> Result<(), BackendError> {
        Ok(())
    }

    async fn scroll_into_view(&mut self, _target: &Locator) -> Result<(), BackendError> {
        Ok(())
    }

    async fn detach_all(&mut self, selector: &str) -> Result<usize, BackendError> {
        let indexes = self.attached_matching(selector);
        for &i in &indexes {
            self.elements[i].detached = true;
        }
        Ok(indexes.len())
    }

    async fn force_hide_all(&mut self, selector: &str) -> Result<usize, BackendError> {
        let mut hidden = 0;
        for i in self.attached_matching(selector) {
            if self.elements[i].hidden_important {
                continue;
            }
            self.elements[i].hidden_important = true;
            hidden += 1;
        }
        Ok(hidden)
    }

    async fn query_overlays(&mut self, selector: &str) -> Result<Vec<OverlayInfo>, BackendError> {
        Ok(self
            .attached_matching(selector)
            .into_iter()
            .map(|i| {
                let el = &self.elements[i];
                OverlayInfo {
                    handle: i as u64,
                    inline_z: el.inline_z,
                    computed_z: el.computed_z,
                    visible: el.visible && !el.hidden_important,
                }
            })
            .collect())
    }

    async fn detach(&mut self, handle: u64) -> Result<bool, BackendError> {
        match self.elements.get_mut(handle as usize) {
            Some(el) if !el.detached => {
                el.detached = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn force_hide(&mut self, handle: u64) -> Result<bool, BackendError> {
        match self.elements.get_mut(handle as usize) {
            Some(el) if !el.hidden_important => {
                el.hidden_important = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn execute_script(&mut self, script: &str) -> Result<serde_json::Value, BackendError> {
        self.scripts.push(script.to_string());
        Ok(serde_json::Value::Null)
    }
}

fn suppressor() -> Suppressor {
    let config = SuppressorConfig {
        signatures: vec![
            ObstructionSignature::frame(r#"iframe[src*="doubleclick"]"#),
            ObstructionSignature::overlay("div, section"),
            ObstructionSignature::interstitial("#google_vignette"),
        ],
        ..SuppressorConfig::default()
    };
    let interstitial = InterstitialConfig {
        markers: vec!["google_vignette".to_string()],
        canonical_root: Some("https://shop.test/".to_string()),
    };
    Suppressor::new(config, interstitial)
}

fn polluted_page() -> DomBackend {
    DomBackend::with_elements(vec![
        // 0: ad frame
        FakeElement::new(vec![r#"iframe[src*="doubleclick"]"#]),
        // 1: blocking overlay, well above any threshold
        FakeElement::new(vec!["div, section", "#overlay"]).with_inline_z(2000),
        // 2: legitimate stacked element, below both thresholds
        FakeElement::new(vec!["div, section", "#banner"]).with_inline_z(50),
        // 3: interstitial wrapper
        FakeElement::new(vec!["#google_vignette"]),
    ])
}

#[tokio::test]
async fn removes_high_z_overlay_but_leaves_legitimate_content() {
    let mut dom = polluted_page();
    let report = suppressor()
        .suppress(&mut dom, Severity::Conservative)
        .await;

    assert_eq!(report.detached, 2, "frame + overlay");
    assert_eq!(report.hidden, 1, "interstitial wrapper");

    // The overlay's own selector now resolves to nothing...
    assert!(dom.attached_matching("#overlay").is_empty());
    // ...while the z-index 50 element is untouched.
    let banner = dom.attached_matching("#banner");
    assert_eq!(banner.len(), 1);
    assert!(!dom.elements[banner[0]].hidden_important);
}

#[tokio::test]
async fn second_sweep_is_a_noop() {
    let mut dom = polluted_page();
    let sweeper = suppressor();

    sweeper.suppress(&mut dom, Severity::Conservative).await;
    let after_first = dom.elements.clone();

    let report = sweeper.suppress(&mut dom, Severity::Conservative).await;
    assert!(report.is_noop(), "second sweep mutated the document");
    assert_eq!(dom.elements, after_first);
}

#[tokio::test]
async fn empty_page_is_a_silent_noop() {
    let mut dom = DomBackend::with_elements(vec![]);
    let report = suppressor().suppress(&mut dom, Severity::Aggressive).await;
    assert!(report.is_noop());
}

#[tokio::test]
async fn aggressive_sweep_consults_computed_stacking_order() {
    // Stacked via a stylesheet only: no inline z-index to read.
    let dom_elements = vec![
        FakeElement::new(vec!["div, section", "#styled-overlay"]).with_computed_z_only(700),
    ];

    let mut dom = DomBackend::with_elements(dom_elements.clone());
    let report = suppressor()
        .suppress(&mut dom, Severity::Conservative)
        .await;
    assert!(report.is_noop(), "conservative sweeps only trust inline values");

    let mut dom = DomBackend::with_elements(dom_elements);
    let report = suppressor().suppress(&mut dom, Severity::Aggressive).await;
    assert_eq!(report.detached, 1, "700 exceeds the aggressive cutoff of 500");
}

#[tokio::test]
async fn overlay_at_the_threshold_is_kept() {
    let mut dom = DomBackend::with_elements(vec![
        FakeElement::new(vec!["div, section"]).with_inline_z(1000),
    ]);
    let report = suppressor()
        .suppress(&mut dom, Severity::Conservative)
        .await;
    assert!(report.is_noop(), "cutoff is exclusive");
}

#[tokio::test]
async fn already_hidden_overlay_is_skipped() {
    let mut dom = DomBackend::with_elements(vec![{
        let mut el = FakeElement::new(vec!["div, section"]).with_inline_z(3000);
        el.visible = false;
        el
    }]);
    let report = suppressor()
        .suppress(&mut dom, Severity::Conservative)
        .await;
    assert!(report.is_noop());
}

#[tokio::test]
async fn signature_threshold_overrides_severity_default() {
    let config = SuppressorConfig {
        signatures: vec![ObstructionSignature::overlay(".modal-backdrop").with_threshold(100)],
        ..SuppressorConfig::default()
    };
    let sweeper = Suppressor::new(config, InterstitialConfig::default());

    let mut dom = DomBackend::with_elements(vec![
        FakeElement::new(vec![".modal-backdrop"]).with_inline_z(300),
    ]);
    let report = sweeper.suppress(&mut dom, Severity::Conservative).await;
    assert_eq!(report.detached, 1);
}

#[tokio::test]
async fn interstitial_container_is_detached_under_aggressive_sweeps() {
    let mut dom = polluted_page();
    suppressor().suppress(&mut dom, Severity::Aggressive).await;

    assert!(dom.attached_matching("#google_vignette").is_empty());
}

#[tokio::test]
async fn redirects_away_from_interstitial_urls() {
    let mut dom = DomBackend::with_elements(vec![]);
    dom.url = "https://shop.test/products#google_vignette".to_string();

    let redirected = suppressor()
        .redirect_away_from_interstitial(&mut dom)
        .await
        .unwrap();
    assert!(redirected);
    assert_eq!(dom.navigations, vec!["https://shop.test/"]);
}

#[tokio::test]
async fn clean_urls_are_not_redirected() {
    let mut dom = DomBackend::with_elements(vec![]);
    dom.url = "https://shop.test/view_cart".to_string();

    let redirected = suppressor()
        .redirect_away_from_interstitial(&mut dom)
        .await
        .unwrap();
    assert!(!redirected);
    assert!(dom.navigations.is_empty());
}

#[tokio::test]
async fn origin_guard_returns_to_the_canonical_host() {
    let mut dom = DomBackend::with_elements(vec![]);
    dom.url = "https://ads.example.net/landing".to_string();

    suppressor().ensure_on_origin(&mut dom).await.unwrap();
    assert_eq!(dom.navigations, vec!["https://shop.test/"]);
}

#[tokio::test]
async fn origin_guard_leaves_on_origin_documents_alone() {
    let mut dom = DomBackend::with_elements(vec![]);
    dom.url = "https://shop.test/category_products/1".to_string();

    suppressor().ensure_on_origin(&mut dom).await.unwrap();
    assert!(dom.navigations.is_empty());
}

#[tokio::test]
async fn fragment_scrub_goes_through_the_script_capability() {
    let mut dom = DomBackend::with_elements(vec![]);
    suppressor().strip_url_fragment(&mut dom).await.unwrap();

    assert_eq!(dom.scripts.len(), 1);
    assert!(dom.scripts[0].contains("history.replaceState"));
}
