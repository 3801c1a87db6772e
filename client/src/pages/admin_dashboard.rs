//! Admin dashboard: headline statistics and the recent activity feed.
//!
//! SYSTEM CONTEXT
//! ==============
//! Both panels reload whenever the backend reports a change to the
//! activities or statistics collections, so another admin's edits show up
//! without a refresh. Relative ages are re-rendered once a minute.

#[cfg(test)]
#[path = "admin_dashboard_test.rs"]
mod admin_dashboard_test;

use leptos::prelude::*;
use session::Collection;
use session::procedures::activity::{ActivityEntry, ActivityIcon};
use session::procedures::admin::{DashboardTile, Trend, empty_dashboard};

use crate::components::status::ErrorBanner;
use crate::state::auth::use_session;
use crate::util::clock;

fn icon_glyph(icon: ActivityIcon) -> &'static str {
    match icon {
        ActivityIcon::ResourceAdded => "📚",
        ActivityIcon::ResourceUpdated => "✏️",
        ActivityIcon::ResourceDeleted => "🗑",
        ActivityIcon::StudentRegistered => "🎓",
        ActivityIcon::StudentRemoved => "🚫",
        ActivityIcon::FeedbackSubmitted => "💬",
        ActivityIcon::FeedbackRemoved => "🧹",
        ActivityIcon::Other => "•",
    }
}

fn trend_class(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "stat-tile__change stat-tile__change--up",
        Trend::Down => "stat-tile__change stat-tile__change--down",
        Trend::Neutral => "stat-tile__change",
    }
}

/// Whole numbers render without a fraction.
#[allow(clippy::cast_possible_truncation)]
fn tile_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 { format!("{}", value as i64) } else { format!("{value:.1}") }
}

#[component]
pub fn AdminDashboardPage() -> impl IntoView {
    let session = use_session();

    let tiles = RwSignal::new(empty_dashboard());
    let activities = RwSignal::new(Vec::<ActivityEntry>::new());
    let stats_tick = RwSignal::new(0_u32);
    let activity_tick = RwSignal::new(0_u32);
    let now = RwSignal::new(clock::now());
    let error = RwSignal::new(None::<String>);

    session.watch(Collection::Statistics, stats_tick);
    session.watch(Collection::Activities, activity_tick);

    Effect::new(move || {
        stats_tick.track();
        session.run(error, move |store| async move {
            tiles.set(store.dashboard_stats().await?);
            Ok(())
        });
    });

    Effect::new(move || {
        activity_tick.track();
        session.run(error, move |store| async move {
            activities.set(store.recent_activities().await?);
            now.set(clock::now());
            Ok(())
        });
    });

    #[cfg(feature = "hydrate")]
    {
        let alive = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
        let alive_task = alive.clone();
        leptos::task::spawn_local(async move {
            loop {
                gloo_timers::future::sleep(std::time::Duration::from_secs(60)).await;
                if !alive_task.load(std::sync::atomic::Ordering::Relaxed) {
                    break;
                }
                now.set(clock::now());
            }
        });
        on_cleanup(move || alive.store(false, std::sync::atomic::Ordering::Relaxed));
    }

    let tile_view = |tile: DashboardTile| {
        view! {
            <div class="stat-tile">
                <span class="stat-tile__title">{tile.title}</span>
                <span class="stat-tile__value">{tile_value(tile.value)}</span>
                <span class=trend_class(tile.trend)>{tile.change}</span>
            </div>
        }
    };

    view! {
        <div class="admin-dashboard">
            <h1>"Dashboard"</h1>
            <ErrorBanner error=error/>
            <div class="admin-dashboard__tiles">
                {move || tiles.get().into_iter().map(tile_view).collect_view()}
            </div>
            <section class="admin-dashboard__activity">
                <h2>"Recent Activity"</h2>
                <Show
                    when=move || activities.with(|a| !a.is_empty())
                    fallback=|| view! { <p class="admin-dashboard__empty">"No recent activity."</p> }
                >
                    <ul class="activity-list">
                        {move || {
                            let at = now.get();
                            activities
                                .get()
                                .into_iter()
                                .map(|entry| {
                                    view! {
                                        <li class="activity-list__item">
                                            <span class="activity-list__icon">{icon_glyph(entry.icon())}</span>
                                            <span class="activity-list__message">{entry.message.clone()}</span>
                                            <span class="activity-list__age">{entry.age(at)}</span>
                                        </li>
                                    }
                                })
                                .collect_view()
                        }}
                    </ul>
                </Show>
            </section>
        </div>
    }
}
