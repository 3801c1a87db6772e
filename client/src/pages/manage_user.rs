//! Admin student directory with search, paging, and account removal.

use leptos::prelude::*;
use session::Collection;
use session::procedures::admin::StudentPage;

use crate::components::confirm_delete::ConfirmDelete;
use crate::components::status::{ErrorBanner, Notice, Pager};
use crate::state::auth::use_session;

#[component]
pub fn ManageUserPage() -> impl IntoView {
    let session = use_session();

    let listing = RwSignal::new(StudentPage::default());
    let page = RwSignal::new(1_u32);
    let search_input = RwSignal::new(String::new());
    let search = RwSignal::new(String::new());
    let tick = RwSignal::new(0_u32);
    let pending_delete = RwSignal::new(None::<String>);
    let error = RwSignal::new(None::<String>);
    let notice = RwSignal::new(None::<String>);

    session.watch(Collection::Users, tick);

    Effect::new(move || {
        tick.track();
        let page = page.get();
        let term = search.get();
        session.run(error, move |store| async move {
            listing.set(store.students(page, &term).await?);
            Ok(())
        });
    });

    let on_search = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        page.set(1);
        search.set(search_input.get());
    };

    let on_confirm = Callback::new(move |user_id: String| {
        session.run(error, move |store| async move {
            store.delete_student(&user_id).await?;
            listing.update(|l| l.students.retain(|s| s.user_id != user_id));
            notice.set(Some("Student removed.".to_owned()));
            Ok(())
        });
    });

    view! {
        <div class="admin-page">
            <h1>"Manage Users"</h1>
            <ErrorBanner error=error/>
            <Notice notice=notice/>
            <form class="admin-page__search" on:submit=on_search>
                <input
                    class="admin-page__search-input"
                    type="text"
                    placeholder="Search by name or email"
                    prop:value=move || search_input.get()
                    on:input=move |ev| search_input.set(event_target_value(&ev))
                />
                <button type="submit">"Search"</button>
            </form>
            <table class="admin-table">
                <thead>
                    <tr>
                        <th>"Name"</th>
                        <th>"Email"</th>
                        <th>"Status"</th>
                        <th></th>
                    </tr>
                </thead>
                <tbody>
                    <For each=move || listing.get().students key=|s| s.user_id.clone() let:student>
                        {
                            let user_id = student.user_id.clone();
                            view! {
                                <tr>
                                    <td>{student.display_name().to_owned()}</td>
                                    <td>{student.user_email.clone().unwrap_or_else(|| "N/A".to_owned())}</td>
                                    <td>
                                        <span
                                            class="status-pill"
                                            class:status-pill--active=student.is_active()
                                        >
                                            {student.status().to_owned()}
                                        </span>
                                    </td>
                                    <td>
                                        <button
                                            class="btn btn--danger"
                                            on:click=move |_| pending_delete.set(Some(user_id.clone()))
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
            <Show when=move || listing.with(|l| l.students.is_empty())>
                <p class="admin-page__empty">"No students found."</p>
            </Show>
            <Pager page=page total_pages=Signal::derive(move || listing.with(|l| l.total_pages))/>
            <ConfirmDelete
                target=pending_delete
                title="Delete Student"
                message="This will permanently remove the student's account."
                on_confirm=on_confirm
            />
        </div>
    }
}
