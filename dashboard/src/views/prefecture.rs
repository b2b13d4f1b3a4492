use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use maud::{Markup, html};
use tracker::{Dose, Entity, EntityAggregate, Frame, Tracker};

use crate::charts::{self, svg};
use crate::config::DAILY_CHART_DAYS;
use crate::state::AppState;
use crate::styles::Charts as ChartClass;

use super::breadcrumbs::{Breadcrumb, breadcrumbs};
use super::page_shell;

pub async fn prefecture_detail(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Markup, StatusCode> {
    let Ok(entity) = id.parse::<Entity>();
    let name = display_name(&state.tracker, &entity).ok_or(StatusCode::NOT_FOUND)?;
    let aggregate = state.tracker.aggregate(&entity);
    let frame = state.latest_frame();

    let content = html! {
        (breadcrumbs(&[
            Breadcrumb { label: "japan", href: Some("/") },
            Breadcrumb { label: &name, href: None },
        ]))
        @match aggregate {
            Some(aggregate) => {
                (render_detail(&state.tracker, &entity, &aggregate, frame.as_deref()))
            }
            None => {
                p { "Waiting for vaccination data..." }
            }
        }
    };
    Ok(page_shell(&format!("{name} | Vaccination Tracker"), content))
}

fn display_name(tracker: &Tracker, entity: &Entity) -> Option<String> {
    match entity {
        Entity::Total => Some("全国".to_owned()),
        Entity::Prefecture(id) => tracker.catalog().get(id).map(|p| p.name.clone()),
    }
}

fn population(tracker: &Tracker, entity: &Entity) -> Option<u64> {
    match entity {
        Entity::Total => Some(tracker.catalog().total_population()).filter(|p| *p > 0),
        Entity::Prefecture(id) => tracker.catalog().get(id).and_then(|p| p.population),
    }
}

pub fn render_detail(
    tracker: &Tracker,
    entity: &Entity,
    aggregate: &EntityAggregate,
    frame: Option<&Frame>,
) -> Markup {
    // Fall back to the data-day totals until the ticker has produced a frame.
    let current = frame
        .and_then(|f| f.get(entity))
        .map(|e| e.value)
        .unwrap_or(aggregate.base.map(|v| v as i64));
    let population = population(tracker, entity);

    let daily = charts::daily_series(aggregate, DAILY_CHART_DAYS);
    let cumulative = charts::cumulative_series(aggregate);

    html! {
        div.(ChartClass::CHART_CONTAINER) {
            div.(ChartClass::CHART_HEADER) {
                span { "> current estimate" }
            }
            @for dose in Dose::ALL {
                @let i = dose.index();
                div {
                    (dose.display_name()) ": " (svg::format_count(current[i]))
                    " (+" (format!("{:.0}", aggregate.rate[i])) "/day)"
                    @if let Some(share) = charts::population_share(current[i], population) {
                        " " span.(ChartClass::POPULATION_SHARE) { (format!("{share:.2}%")) }
                    }
                }
            }
        }

        h2 { "> daily doses" }
        div.(ChartClass::CHART_CONTAINER) {
            (legend())
            (svg::render_daily_chart(&daily, "doses per day"))
        }

        h2 { "> cumulative doses" }
        div.(ChartClass::CHART_CONTAINER) {
            (legend())
            (svg::render_cumulative_chart(&cumulative, "cumulative doses"))
        }
    }
}

fn legend() -> Markup {
    html! {
        div.(ChartClass::CHART_LEGEND) {
            span.(ChartClass::LEGEND_FIRST) { "■ " (Dose::First.display_name()) }
            span.(ChartClass::LEGEND_SECOND) { "■ " (Dose::Second.display_name()) }
        }
    }
}
