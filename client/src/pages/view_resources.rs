//! Support resources directory.
//!
//! Every signed-in user can browse and filter; admins also get add, edit,
//! and delete controls. The list follows realtime changes to the
//! resources collection.

#[cfg(test)]
#[path = "view_resources_test.rs"]
mod view_resources_test;

use leptos::prelude::*;
use session::procedures::resources::{RESOURCE_TYPES, Resource, ResourceDraft, ResourcePage, ResourceQuery};
use session::{Collection, Role, SessionSnapshot};

use crate::components::confirm_delete::ConfirmDelete;
use crate::components::status::{ErrorBanner, Notice, Pager};
use crate::state::auth::use_session;

fn type_label(raw: &str) -> String {
    match raw {
        "assosiation" => "Association".to_owned(),
        "consultant" => "Consultant".to_owned(),
        other => {
            let mut chars = other.chars();
            chars.next().map_or_else(String::new, |c| c.to_uppercase().chain(chars).collect())
        }
    }
}

fn can_edit(snapshot: &SessionSnapshot) -> bool {
    snapshot.is_authenticated() && snapshot.role() == Some(Role::Admin)
}

/// Cards re-render when any displayed field changes, not only on new ids.
fn card_key(resource: &Resource) -> (String, [String; 5]) {
    let f = &resource.fields;
    (
        resource.resource_id.clone(),
        [
            f.resource_type.clone(),
            f.resource_name.clone(),
            f.resource_details.clone(),
            f.resource_contact.clone(),
            f.resource_time.clone(),
        ],
    )
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Editor {
    Add,
    Edit(String),
}

#[component]
pub fn ViewResourcesPage() -> impl IntoView {
    let session = use_session();

    let listing = RwSignal::new(ResourcePage::default());
    let page = RwSignal::new(1_u32);
    let type_filter = RwSignal::new(String::new());
    let search_input = RwSignal::new(String::new());
    let search = RwSignal::new(String::new());
    let tick = RwSignal::new(0_u32);
    let editor = RwSignal::new(None::<Editor>);
    let draft = RwSignal::new(ResourceDraft::default());
    let pending_delete = RwSignal::new(None::<String>);
    let busy = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);
    let notice = RwSignal::new(None::<String>);

    let is_admin = move || session.snapshot.with(can_edit);
    let per_page = move || session.store().map_or(9, |s| s.config().resources_per_page);

    session.watch(Collection::Resources, tick);

    Effect::new(move || {
        tick.track();
        let query = ResourceQuery {
            page: page.get(),
            resource_type: Some(type_filter.get()).filter(|t| !t.is_empty()),
            search_query: search.get(),
        };
        session.run(error, move |store| async move {
            listing.set(store.resources(&query).await?);
            Ok(())
        });
    });

    let on_search = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        page.set(1);
        search.set(search_input.get().trim().to_owned());
    };

    let open_add = move |_| {
        draft.set(ResourceDraft { resource_type: RESOURCE_TYPES[0].to_owned(), ..ResourceDraft::default() });
        editor.set(Some(Editor::Add));
    };

    let open_edit = move |resource_id: String| {
        session.run(error, move |store| async move {
            let resource = store.resource(&resource_id).await?;
            draft.set(resource.fields);
            editor.set(Some(Editor::Edit(resource.resource_id)));
            Ok(())
        });
    };

    let on_save = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Some(mode) = editor.get() else {
            return;
        };
        let fields = match draft.get().validated() {
            Ok(d) => d,
            Err(msg) => {
                error.set(Some(msg.to_owned()));
                return;
            }
        };
        busy.set(true);
        session.run(error, move |store| async move {
            let saved = match &mode {
                Editor::Add => store.add_resource(fields).await,
                Editor::Edit(id) => store.update_resource(id, fields).await,
            };
            busy.set(false);
            saved?;
            editor.set(None);
            notice.set(Some(
                match mode {
                    Editor::Add => "Resource added.",
                    Editor::Edit(_) => "Resource updated.",
                }
                .to_owned(),
            ));
            tick.update(|n| *n = n.wrapping_add(1));
            Ok(())
        });
    };

    let on_confirm = Callback::new(move |resource_id: String| {
        session.run(error, move |store| async move {
            store.delete_resource(&resource_id).await?;
            listing.update(|l| l.data.retain(|r| r.resource_id != resource_id));
            notice.set(Some("Resource deleted.".to_owned()));
            Ok(())
        });
    });

    let draft_input = move |label: &'static str, get: fn(&ResourceDraft) -> &String, set: fn(&mut ResourceDraft, String)| {
        view! {
            <label class="resource-form__label">{label}</label>
            <input
                class="resource-form__input"
                prop:value=move || draft.with(|d| get(d).clone())
                on:input=move |ev| draft.update(|d| set(d, event_target_value(&ev)))
            />
        }
    };

    view! {
        <div class="resources-page">
            <h1>"Resources"</h1>
            <ErrorBanner error=error/>
            <Notice notice=notice/>
            <div class="resources-page__toolbar">
                <label class="resources-page__type">"Type:"</label>
                <select
                    prop:value=move || type_filter.get()
                    on:change=move |ev| {
                        page.set(1);
                        type_filter.set(event_target_value(&ev));
                    }
                >
                    <option value="">"All"</option>
                    {RESOURCE_TYPES
                        .into_iter()
                        .map(|t| view! { <option value=t>{type_label(t)}</option> })
                        .collect_view()}
                </select>
                <form class="resources-page__search" on:submit=on_search>
                    <input
                        type="text"
                        placeholder="Search resources"
                        prop:value=move || search_input.get()
                        on:input=move |ev| search_input.set(event_target_value(&ev))
                    />
                    <button type="submit">"Search"</button>
                </form>
                <Show when=is_admin>
                    <button class="btn btn--primary" on:click=open_add>"Add Resource"</button>
                </Show>
            </div>
            <div class="resource-grid">
                <For
                    each=move || listing.get().data
                    key=card_key
                    let:resource
                >
                    {
                        let edit_id = resource.resource_id.clone();
                        let delete_id = resource.resource_id.clone();
                        let fields = resource.fields;
                        view! {
                            <article class="resource-card">
                                <span class="resource-card__type">{type_label(&fields.resource_type)}</span>
                                <h3 class="resource-card__name">{fields.resource_name}</h3>
                                <p class="resource-card__details">{fields.resource_details}</p>
                                <p class="resource-card__contact">{fields.resource_contact}</p>
                                <p class="resource-card__time">{fields.resource_time}</p>
                                <Show when=is_admin>
                                    {
                                        let edit_id = edit_id.clone();
                                        let delete_id = delete_id.clone();
                                        view! {
                                            <div class="resource-card__actions">
                                                <button class="btn" on:click=move |_| open_edit(edit_id.clone())>
                                                    "Edit"
                                                </button>
                                                <button
                                                    class="btn btn--danger"
                                                    on:click=move |_| pending_delete.set(Some(delete_id.clone()))
                                                >
                                                    "Delete"
                                                </button>
                                            </div>
                                        }
                                    }
                                </Show>
                            </article>
                        }
                    }
                </For>
            </div>
            <Show when=move || listing.with(|l| l.data.is_empty())>
                <p class="resources-page__empty">"No resources found."</p>
            </Show>
            <Pager page=page total_pages=Signal::derive(move || listing.with(|l| l.pages(per_page())))/>
            <Show when=move || editor.get().is_some()>
                <div class="dialog-backdrop" on:click=move |_| editor.set(None)>
                    <form class="dialog resource-form" on:click=move |ev| ev.stop_propagation() on:submit=on_save>
                        <h2>
                            {move || match editor.get() {
                                Some(Editor::Edit(_)) => "Edit Resource",
                                _ => "Add Resource",
                            }}
                        </h2>
                        <label class="resource-form__label">"Type"</label>
                        <select
                            prop:value=move || draft.with(|d| d.resource_type.clone())
                            on:change=move |ev| draft.update(|d| d.resource_type = event_target_value(&ev))
                        >
                            {RESOURCE_TYPES
                                .into_iter()
                                .map(|t| view! { <option value=t>{type_label(t)}</option> })
                                .collect_view()}
                        </select>
                        {draft_input("Name", |d| &d.resource_name, |d, v| d.resource_name = v)}
                        {draft_input("Contact", |d| &d.resource_contact, |d, v| d.resource_contact = v)}
                        {draft_input("Time", |d| &d.resource_time, |d, v| d.resource_time = v)}
                        <label class="resource-form__label">"Description"</label>
                        <textarea
                            class="resource-form__textarea"
                            prop:value=move || draft.with(|d| d.resource_details.clone())
                            on:input=move |ev| draft.update(|d| d.resource_details = event_target_value(&ev))
                        ></textarea>
                        <div class="dialog__actions">
                            <button type="button" class="btn" on:click=move |_| editor.set(None)>"Cancel"</button>
                            <button type="submit" class="btn btn--primary" disabled=move || busy.get()>
                                {move || if busy.get() { "Saving..." } else { "Save" }}
                            </button>
                        </div>
                    </form>
                </div>
            </Show>
            <ConfirmDelete
                target=pending_delete
                title="Delete Resource"
                message="This resource will be permanently removed from the directory."
                on_confirm=on_confirm
            />
        </div>
    }
}
