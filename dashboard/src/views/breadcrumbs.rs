use maud::{Markup, html};

use crate::styles::Breadcrumbs as BreadcrumbClass;

pub struct Breadcrumb<'a> {
    pub label: &'a str,
    pub href: Option<&'a str>,
}

pub fn breadcrumbs(items: &[Breadcrumb<'_>]) -> Markup {
    html! {
        nav.(BreadcrumbClass::BREADCRUMBS) {
            @for (i, item) in items.iter().enumerate() {
                @if i > 0 { span { "/" } }
                @match item.href {
                    Some(href) => {
                        a href=(href) { (item.label) }
                    }
                    None => {
                        span.(BreadcrumbClass::BREADCRUMB_CURRENT) { (item.label) }
                    }
                }
            }
        }
    }
}
