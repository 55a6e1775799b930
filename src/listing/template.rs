//! Embedded HTML template for the listing page

use crate::core::error::ListingResult;
use crate::listing::view::ListingContext;
use tera::{Context, Tera};

const LISTING_TEMPLATE: &str = "requests.html";

/// Tera instance holding the listing template
///
/// The template is compiled once at startup. The `.html` suffix turns on
/// tera's autoescaping, so request paths and filter values are safe to echo.
#[derive(Clone)]
pub struct ListingTemplates {
    tera: Tera,
}

impl ListingTemplates {
    pub fn new() -> ListingResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            LISTING_TEMPLATE,
            include_str!("../../templates/requests.html"),
        )?;
        Ok(Self { tera })
    }

    /// Render the listing page
    pub fn render(&self, ctx: &ListingContext) -> ListingResult<String> {
        let context = Context::from_serialize(ctx)?;
        Ok(self.tera.render(LISTING_TEMPLATE, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filters::FilterEntry;
    use crate::core::preferences::{OrderBy, OrderDir, ViewStyle};
    use crate::core::record::{RequestRecord, RequestRow};
    use indexmap::IndexMap;

    fn context() -> ListingContext {
        let mut filters = IndexMap::new();
        filters.insert(
            "f1".to_string(),
            FilterEntry {
                typ: "PathFilter".to_string(),
                value: "<script>".to_string(),
                label: "Path == <script>".to_string(),
            },
        );
        ListingContext {
            show: 25,
            order_by: "start_time".to_string(),
            order_dir: "DESC".to_string(),
            view_style: "card".to_string(),
            options_show: vec![5, 10, 25],
            options_order_by: OrderBy::options(),
            options_order_dir: OrderDir::options(),
            options_view_style: ViewStyle::options(),
            options_paths: vec!["/a".to_string()],
            options_status_codes: vec![200],
            options_methods: vec!["GET".to_string()],
            view_names: vec![],
            filters,
            filter_kinds: crate::core::filters::RequestFilter::KINDS.to_vec(),
            new_filter_ident: "new1".to_string(),
            csrf_token: "token123".to_string(),
            path: None,
            results: vec![RequestRow {
                request: RequestRecord::new("GET", "/orders/42").with_time_taken(12.5),
                status_code: Some(200),
                db_time: Some(3.0),
                num_queries: None,
            }],
        }
    }

    #[test]
    fn test_render_includes_rows_and_token() {
        let templates = ListingTemplates::new().unwrap();
        let html = templates.render(&context()).unwrap();
        assert!(html.contains("12.5ms"));
        assert!(html.contains("token123"));
        assert!(html.contains("Time on queries"));
    }

    #[test]
    fn test_render_shows_zero_timings() {
        let mut ctx = context();
        ctx.results[0].request = RequestRecord::new("GET", "/fast").with_time_taken(0.0);
        ctx.results[0].db_time = Some(0.0);
        let templates = ListingTemplates::new().unwrap();
        let html = templates.render(&ctx).unwrap();
        assert!(html.contains("Time 0"));
        assert!(html.contains("Time on queries 0"));
    }

    #[test]
    fn test_render_offers_new_filter_row() {
        let templates = ListingTemplates::new().unwrap();
        let html = templates.render(&context()).unwrap();
        assert!(html.contains("name=\"filter-new1-typ\""));
        assert!(html.contains("name=\"filter-new1-value\""));
        assert!(html.contains("list=\"paths\""));
        assert!(html.contains("<option value=\"StatusCodeFilter\""));
    }

    #[test]
    fn test_render_escapes_filter_values() {
        let templates = ListingTemplates::new().unwrap();
        let html = templates.render(&context()).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
