mod global {
    turf::style_sheet!("assets/global.css");
}

mod breadcrumbs {
    turf::style_sheet!("assets/breadcrumbs.css");
}

mod counts {
    turf::style_sheet!("assets/counts.css");
}

mod charts {
    turf::style_sheet!("assets/charts.css");
}

pub use breadcrumbs::ClassName as Breadcrumbs;
pub use charts::ClassName as Charts;
pub use counts::ClassName as Counts;

use std::sync::LazyLock;

pub static ALL: LazyLock<String> = LazyLock::new(|| {
    [
        global::STYLE_SHEET,
        breadcrumbs::STYLE_SHEET,
        counts::STYLE_SHEET,
        charts::STYLE_SHEET,
    ]
    .join("\n")
});
