//! Super-admin page for inviting admins and tracking sent invitations.

#[cfg(test)]
#[path = "invite_admin_test.rs"]
mod invite_admin_test;

use leptos::prelude::*;
use session::Collection;
use session::procedures::activity::parse_timestamp;
use session::procedures::admin::{InvitationPage, InvitationQuery, InvitationStatus};
use time::macros::format_description;

use crate::components::status::{ErrorBanner, Notice, Pager};
use crate::state::auth::use_session;

fn status_class(status: InvitationStatus) -> &'static str {
    match status {
        InvitationStatus::Sent => "status-pill status-pill--pending",
        InvitationStatus::Registered => "status-pill status-pill--active",
        InvitationStatus::Expired => "status-pill status-pill--expired",
        InvitationStatus::Unknown => "status-pill",
    }
}

fn when(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "N/A".to_owned();
    };
    parse_timestamp(raw)
        .and_then(|at| at.format(format_description!("[year]-[month]-[day] [hour]:[minute]")).ok())
        .unwrap_or_else(|| raw.to_owned())
}

#[component]
pub fn InviteAdminPage() -> impl IntoView {
    let session = use_session();

    let email = RwSignal::new(String::new());
    let busy = RwSignal::new(false);
    let listing = RwSignal::new(InvitationPage::default());
    let query = RwSignal::new(InvitationQuery::default());
    let page = RwSignal::new(1_u32);
    let tick = RwSignal::new(0_u32);
    let error = RwSignal::new(None::<String>);
    let notice = RwSignal::new(None::<String>);

    let per_page = move || session.store().map_or(10, |s| s.config().invitations_per_page);

    session.watch(Collection::Invitations, tick);

    Effect::new(move || {
        tick.track();
        let mut current = query.get();
        current.page = page.get();
        session.run(error, move |store| async move {
            listing.set(store.invitations(&current).await?);
            Ok(())
        });
    });

    let on_invite = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let address = email.get().trim().to_owned();
        if address.is_empty() {
            error.set(Some("Please enter an email".to_owned()));
            return;
        }
        busy.set(true);
        notice.set(None);
        session.run(error, move |store| async move {
            let sent = store.invite_admin(&address).await;
            busy.set(false);
            sent?;
            email.set(String::new());
            notice.set(Some("Admin invited successfully!".to_owned()));
            Ok(())
        });
    };

    let toggle_order = move |_| {
        query.update(|q| q.sort_order = q.sort_order.flipped());
        page.set(1);
    };

    view! {
        <div class="admin-page">
            <h1>"Invite Admin"</h1>
            <ErrorBanner error=error/>
            <Notice notice=notice/>
            <form class="invite-form" on:submit=on_invite>
                <input
                    class="invite-form__input"
                    type="email"
                    placeholder="admin@example.com"
                    prop:value=move || email.get()
                    on:input=move |ev| email.set(event_target_value(&ev))
                    disabled=move || busy.get()
                />
                <button class="btn btn--primary" type="submit" disabled=move || busy.get()>
                    {move || if busy.get() { "Sending..." } else { "Send Invitation" }}
                </button>
            </form>
            <h2>"Sent Invitations"</h2>
            <table class="admin-table">
                <thead>
                    <tr>
                        <th>"Email"</th>
                        <th>"Status"</th>
                        <th class="admin-table__sortable" on:click=toggle_order>
                            "Sent"
                            {move || match query.with(|q| q.sort_order) {
                                session::procedures::SortOrder::Asc => " ▲",
                                session::procedures::SortOrder::Desc => " ▼",
                            }}
                        </th>
                        <th>"Expires"</th>
                    </tr>
                </thead>
                <tbody>
                    {move || {
                        listing
                            .get()
                            .invitations
                            .into_iter()
                            .map(|invite| {
                                view! {
                                    <tr>
                                        <td>{invite.email}</td>
                                        <td>
                                            <span class=status_class(invite.status)>{invite.status.label()}</span>
                                        </td>
                                        <td>{when(invite.sent_at.as_deref())}</td>
                                        <td>{when(invite.expires_at.as_deref())}</td>
                                    </tr>
                                }
                            })
                            .collect_view()
                    }}
                </tbody>
            </table>
            <Show when=move || listing.with(|l| l.invitations.is_empty())>
                <p class="admin-page__empty">"No invitations sent yet."</p>
            </Show>
            <Pager page=page total_pages=Signal::derive(move || listing.with(|l| l.pages(per_page())))/>
        </div>
    }
}
