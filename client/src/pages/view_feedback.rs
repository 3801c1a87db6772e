//! Admin feedback review table: filter, sort, search, page, delete.

#[cfg(test)]
#[path = "view_feedback_test.rs"]
mod view_feedback_test;

use leptos::prelude::*;
use session::Collection;
use session::procedures::SortOrder;
use session::procedures::activity::parse_timestamp;
use session::procedures::feedback::{FeedbackCategory, FeedbackFilters, FeedbackPage, FeedbackQuery};
use time::macros::format_description;

use crate::components::confirm_delete::ConfirmDelete;
use crate::components::status::{ErrorBanner, Notice, Pager};
use crate::pages::feedback::stars;
use crate::state::auth::use_session;

fn filters_from_form(category: &str, rating: &str, start_date: &str, end_date: &str) -> FeedbackFilters {
    let non_empty = |raw: &str| Some(raw.trim().to_owned()).filter(|s| !s.is_empty());
    FeedbackFilters {
        category: FeedbackCategory::parse(category),
        rating: rating.trim().parse().ok().filter(|r| (1..=5).contains(r)),
        start_date: non_empty(start_date),
        end_date: non_empty(end_date),
    }
}

/// Calendar date of a backend timestamp, or the raw text when unparseable.
fn short_date(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    parse_timestamp(raw)
        .and_then(|at| at.format(format_description!("[year]-[month]-[day]")).ok())
        .unwrap_or_else(|| raw.to_owned())
}

/// Clicking the active column flips direction; a new column starts descending.
fn toggle_sort(query: &mut FeedbackQuery, field: &str) {
    if query.sort_field == field {
        query.sort_order = query.sort_order.flipped();
    } else {
        query.sort_field = field.to_owned();
        query.sort_order = SortOrder::Desc;
    }
    query.page = 1;
}

fn sort_arrow(query: &FeedbackQuery, field: &str) -> &'static str {
    match (query.sort_field == field, query.sort_order) {
        (false, _) => "",
        (true, SortOrder::Asc) => " ▲",
        (true, SortOrder::Desc) => " ▼",
    }
}

#[component]
pub fn ViewFeedbackPage() -> impl IntoView {
    let session = use_session();

    let query = RwSignal::new(FeedbackQuery::default());
    let listing = RwSignal::new(FeedbackPage::default());
    let page = RwSignal::new(1_u32);
    let search_input = RwSignal::new(String::new());
    let category = RwSignal::new(String::new());
    let rating = RwSignal::new(String::new());
    let start_date = RwSignal::new(String::new());
    let end_date = RwSignal::new(String::new());
    let tick = RwSignal::new(0_u32);
    let pending_delete = RwSignal::new(None::<String>);
    let error = RwSignal::new(None::<String>);
    let notice = RwSignal::new(None::<String>);

    session.watch(Collection::Feedback, tick);

    Effect::new(move || {
        let p = page.get();
        if query.with_untracked(|q| q.page) != p {
            query.update(|q| q.page = p);
        }
    });

    Effect::new(move || {
        tick.track();
        let current = query.get();
        session.run(error, move |store| async move {
            listing.set(store.feedback_page(&current).await?);
            Ok(())
        });
    });

    let apply = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let filters = filters_from_form(&category.get(), &rating.get(), &start_date.get(), &end_date.get());
        query.update(|q| {
            q.filters = filters;
            q.search_query = search_input.get_untracked().trim().to_owned();
            q.page = 1;
        });
        page.set(1);
    };

    let reset = move |_| {
        category.set(String::new());
        rating.set(String::new());
        start_date.set(String::new());
        end_date.set(String::new());
        search_input.set(String::new());
        query.set(FeedbackQuery::default());
        page.set(1);
    };

    let sort_by = move |field: &'static str| {
        query.update(|q| toggle_sort(q, field));
        page.set(1);
    };

    let on_confirm = Callback::new(move |feedback_id: String| {
        session.run(error, move |store| async move {
            store.delete_feedback(&feedback_id).await?;
            listing.update(|l| l.feedback.retain(|f| f.feedback_id != feedback_id));
            notice.set(Some("Feedback deleted.".to_owned()));
            Ok(())
        });
    });

    let text_input = move |kind: &'static str, placeholder: &'static str, value: RwSignal<String>| {
        view! {
            <input
                class="admin-filters__input"
                type=kind
                placeholder=placeholder
                prop:value=move || value.get()
                on:input=move |ev| value.set(event_target_value(&ev))
            />
        }
    };

    view! {
        <div class="admin-page">
            <h1>"View Feedback"</h1>
            <ErrorBanner error=error/>
            <Notice notice=notice/>
            <form class="admin-filters" on:submit=apply>
                {text_input("text", "Search feedback", search_input)}
                <select
                    class="admin-filters__select"
                    prop:value=move || category.get()
                    on:change=move |ev| category.set(event_target_value(&ev))
                >
                    <option value="">"All categories"</option>
                    {FeedbackCategory::ALL
                        .into_iter()
                        .map(|c| view! { <option value=c.as_str()>{c.label()}</option> })
                        .collect_view()}
                </select>
                <select
                    class="admin-filters__select"
                    prop:value=move || rating.get()
                    on:change=move |ev| rating.set(event_target_value(&ev))
                >
                    <option value="">"All ratings"</option>
                    {(1..=5_u8).map(|n| view! { <option value=n.to_string()>{stars(n)}</option> }).collect_view()}
                </select>
                {text_input("date", "From", start_date)}
                {text_input("date", "To", end_date)}
                <button type="submit">"Apply"</button>
                <button type="button" on:click=reset>"Reset"</button>
            </form>
            <table class="admin-table">
                <thead>
                    <tr>
                        <th class="admin-table__sortable" on:click=move |_| sort_by("timestamp")>
                            "Date"
                            {move || query.with(|q| sort_arrow(q, "timestamp"))}
                        </th>
                        <th>"Student"</th>
                        <th>"Title"</th>
                        <th>"Category"</th>
                        <th class="admin-table__sortable" on:click=move |_| sort_by("feedback_rating")>
                            "Rating"
                            {move || query.with(|q| sort_arrow(q, "feedback_rating"))}
                        </th>
                        <th>"Message"</th>
                        <th></th>
                    </tr>
                </thead>
                <tbody>
                    <For each=move || listing.get().feedback key=|f| f.feedback_id.clone() let:row>
                        {
                            let feedback_id = row.feedback_id.clone();
                            view! {
                                <tr>
                                    <td>{short_date(row.timestamp.as_deref())}</td>
                                    <td>{row.author().to_owned()}</td>
                                    <td>{row.feedback_title.clone().unwrap_or_default()}</td>
                                    <td>{row.category().map_or("Other", FeedbackCategory::label)}</td>
                                    <td class="admin-table__stars">{stars(row.feedback_rating)}</td>
                                    <td class="admin-table__message">{row.feedback_message.clone()}</td>
                                    <td>
                                        <button
                                            class="btn btn--danger"
                                            on:click=move |_| pending_delete.set(Some(feedback_id.clone()))
                                        >
                                            "Delete"
                                        </button>
                                    </td>
                                </tr>
                            }
                        }
                    </For>
                </tbody>
            </table>
            <Show when=move || listing.with(|l| l.feedback.is_empty())>
                <p class="admin-page__empty">"No feedback matches these filters."</p>
            </Show>
            <p class="admin-page__count">{move || format!("{} total", listing.with(|l| l.total_count))}</p>
            <Pager page=page total_pages=Signal::derive(move || listing.with(|l| l.total_pages))/>
            <ConfirmDelete
                target=pending_delete
                title="Delete Feedback"
                message="This feedback entry will be permanently deleted."
                on_confirm=on_confirm
            />
        </div>
    }
}
