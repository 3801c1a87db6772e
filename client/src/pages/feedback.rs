//! Student feedback form.

#[cfg(test)]
#[path = "feedback_test.rs"]
mod feedback_test;

use leptos::prelude::*;
use session::procedures::feedback::{FeedbackCategory, FeedbackSubmission};

use crate::components::status::ErrorBanner;
use crate::state::auth::use_session;

/// Five-star strip for a 0..=5 rating.
pub(crate) fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

#[component]
pub fn FeedbackPage() -> impl IntoView {
    let session = use_session();

    let title = RwSignal::new(String::new());
    let message = RwSignal::new(String::new());
    let rating = RwSignal::new(0_u8);
    let category = RwSignal::new(FeedbackCategory::General);
    let busy = RwSignal::new(false);
    let submitted = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let submission = FeedbackSubmission {
            title: title.get(),
            message: message.get(),
            rating: rating.get(),
            category: category.get(),
        };
        if let Err(msg) = submission.clone().validated() {
            error.set(Some(msg.to_owned()));
            return;
        }
        busy.set(true);
        session.run(error, move |store| async move {
            let sent = store.submit_feedback(submission).await;
            busy.set(false);
            sent?;
            title.set(String::new());
            message.set(String::new());
            rating.set(0);
            category.set(FeedbackCategory::General);
            submitted.set(true);
            Ok(())
        });
    };

    view! {
        <div class="feedback-page">
            <div class="feedback-card" hidden=move || !submitted.get()>
                <h2>"Thank You for Your Feedback!"</h2>
                <p>"We appreciate you taking the time to help us improve MIRA. Your insights are valuable to us."</p>
                <button class="feedback-card__again" on:click=move |_| submitted.set(false)>
                    "Submit Another Feedback"
                </button>
            </div>
            <div class="feedback-card" hidden=move || submitted.get()>
                <h2>"Share Your Feedback"</h2>
                <p>"We'd love to hear your thoughts about MIRA"</p>
                <ErrorBanner error=error/>
                <form class="feedback-form" on:submit=on_submit>
                    <label class="feedback-form__label">"Feedback Title"</label>
                    <input
                        class="feedback-form__input"
                        type="text"
                        placeholder="Brief description of your feedback"
                        prop:value=move || title.get()
                        on:input=move |ev| title.set(event_target_value(&ev))
                    />
                    <label class="feedback-form__label">"Category"</label>
                    <div class="feedback-form__categories">
                        {FeedbackCategory::ALL
                            .into_iter()
                            .map(|c| {
                                view! {
                                    <button
                                        type="button"
                                        class="feedback-form__category"
                                        class:feedback-form__category--active=move || category.get() == c
                                        on:click=move |_| category.set(c)
                                    >
                                        {c.label()}
                                    </button>
                                }
                            })
                            .collect_view()}
                    </div>
                    <label class="feedback-form__label">"Rating"</label>
                    <div class="feedback-form__rating">
                        {(1..=5_u8)
                            .map(|n| {
                                view! {
                                    <button
                                        type="button"
                                        class="feedback-form__star"
                                        class:feedback-form__star--filled={move || rating.get() >= n}
                                        on:click=move |_| rating.set(n)
                                    >
                                        {move || if rating.get() >= n { "★" } else { "☆" }}
                                    </button>
                                }
                            })
                            .collect_view()}
                    </div>
                    <label class="feedback-form__label">"Your Feedback"</label>
                    <textarea
                        class="feedback-form__textarea"
                        placeholder="Please share your detailed thoughts, suggestions, or issues..."
                        prop:value=move || message.get()
                        on:input=move |ev| message.set(event_target_value(&ev))
                    ></textarea>
                    <button class="feedback-form__submit" type="submit" disabled=move || busy.get()>
                        {move || if busy.get() { "Submitting..." } else { "Submit Feedback" }}
                    </button>
                </form>
            </div>
        </div>
    }
}
