//! Student chat screen: session sidebar plus the message thread.
//!
//! SYSTEM CONTEXT
//! ==============
//! Sessions and messages are persisted through the session store's chat
//! procedures. Assistant replies arrive from the backend as `bot` messages
//! and are rendered as sanitized markdown.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use leptos::prelude::*;
use session::procedures::chat::{ChatMessage, ChatSession, Sender};

use crate::components::status::ErrorBanner;
use crate::state::auth::use_session;
use crate::util::markdown::render_markdown_html;

fn sidebar_label(chat: &ChatSession) -> String {
    if chat.is_ended() { format!("{} (ended)", chat.title()) } else { chat.title().to_owned() }
}

fn can_send(draft: &str, active: Option<&ChatSession>) -> bool {
    !draft.trim().is_empty() && active.is_some_and(|c| !c.is_ended())
}

/// The chat to open when none is selected: the newest one still running.
fn default_chat(chats: &[ChatSession]) -> Option<String> {
    chats.iter().find(|c| !c.is_ended()).or_else(|| chats.first()).map(|c| c.id.clone())
}

#[component]
pub fn ChatPage() -> impl IntoView {
    let session = use_session();

    let chats = RwSignal::new(Vec::<ChatSession>::new());
    let active = RwSignal::new(None::<String>);
    let messages = RwSignal::new(Vec::<ChatMessage>::new());
    let draft = RwSignal::new(String::new());
    let renaming = RwSignal::new(None::<String>);
    let rename_text = RwSignal::new(String::new());
    let reload = RwSignal::new(0_u32);
    let error = RwSignal::new(None::<String>);

    let active_chat = move || {
        let id = active.get()?;
        chats.with(|list| list.iter().find(|c| c.id == id).cloned())
    };

    Effect::new(move || {
        reload.track();
        session.run(error, move |store| async move {
            let list = store.chat_sessions().await?;
            if active.get_untracked().is_none() {
                active.set(default_chat(&list));
            }
            chats.set(list);
            Ok(())
        });
    });

    Effect::new(move || {
        let Some(chat_id) = active.get() else {
            messages.set(Vec::new());
            return;
        };
        session.run(error, move |store| async move {
            let thread = store.chat_messages(&chat_id).await?;
            messages.set(thread);
            Ok(())
        });
    });

    let on_new = move |_| {
        session.run(error, move |store| async move {
            let chat = store.create_chat_session().await?;
            let id = chat.id.clone();
            chats.update(|list| list.insert(0, chat));
            active.set(Some(id));
            Ok(())
        });
    };

    let on_send = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let text = draft.get();
        if !can_send(&text, active_chat().as_ref()) {
            return;
        }
        let Some(chat_id) = active.get() else {
            return;
        };
        draft.set(String::new());
        messages.update(|m| {
            m.push(ChatMessage { message: text.trim().to_owned(), sender: Sender::User, created_at: None });
        });
        session.run(error, move |store| async move {
            store.save_message(&chat_id, &text, Sender::User).await
        });
    };

    let on_end = move |_| {
        let Some(chat_id) = active.get() else {
            return;
        };
        session.run(error, move |store| async move {
            store.end_chat_session(&chat_id).await?;
            reload.update(|n| *n += 1);
            Ok(())
        });
    };

    let delete_chat = move |chat_id: String| {
        session.run(error, move |store| async move {
            store.delete_chat_session(&chat_id).await?;
            chats.update(|list| list.retain(|c| c.id != chat_id));
            if active.get_untracked().as_deref() == Some(chat_id.as_str()) {
                active.set(chats.with_untracked(|list| default_chat(list)));
            }
            Ok(())
        });
    };

    let save_rename = move || {
        let Some(chat_id) = renaming.get() else {
            return;
        };
        let name = rename_text.get();
        renaming.set(None);
        session.run(error, move |store| async move {
            store.rename_chat(&chat_id, &name).await?;
            let name = name.trim().to_owned();
            chats.update(|list| {
                if let Some(chat) = list.iter_mut().find(|c| c.id == chat_id) {
                    chat.name = Some(name);
                }
            });
            Ok(())
        });
    };

    view! {
        <div class="chat-page">
            <aside class="chat-sidebar">
                <button class="chat-sidebar__new" on:click=on_new>"+ New Chat"</button>
                <ul class="chat-sidebar__list">
                    <For each=move || chats.get() key=|c| (c.id.clone(), c.name.clone(), c.ended_at.clone()) let:chat>
                        {
                            let id = chat.id.clone();
                            let select_id = id.clone();
                            let rename_id = id.clone();
                            let delete_id = id.clone();
                            let is_active = move || active.get().as_deref() == Some(id.as_str());
                            let label = sidebar_label(&chat);
                            let current_name = chat.title().to_owned();
                            view! {
                                <li class="chat-sidebar__item" class:chat-sidebar__item--active=is_active>
                                    <button
                                        class="chat-sidebar__select"
                                        on:click=move |_| active.set(Some(select_id.clone()))
                                    >
                                        {label}
                                    </button>
                                    <button
                                        class="chat-sidebar__action"
                                        title="Rename"
                                        on:click=move |_| {
                                            rename_text.set(current_name.clone());
                                            renaming.set(Some(rename_id.clone()));
                                        }
                                    >
                                        "✎"
                                    </button>
                                    <button
                                        class="chat-sidebar__action"
                                        title="Delete"
                                        on:click=move |_| delete_chat(delete_id.clone())
                                    >
                                        "🗑"
                                    </button>
                                </li>
                            }
                        }
                    </For>
                </ul>
                <Show when=move || renaming.get().is_some()>
                    <div class="chat-rename">
                        <input
                            class="chat-rename__input"
                            prop:value=move || rename_text.get()
                            on:input=move |ev| rename_text.set(event_target_value(&ev))
                        />
                        <button on:click=move |_| save_rename()>"Save"</button>
                        <button on:click=move |_| renaming.set(None)>"Cancel"</button>
                    </div>
                </Show>
            </aside>
            <section class="chat-thread">
                <ErrorBanner error=error/>
                <header class="chat-thread__header">
                    <h2>{move || active_chat().map_or_else(|| "MIRA".to_owned(), |c| sidebar_label(&c))}</h2>
                    <Show when=move || active_chat().is_some_and(|c| !c.is_ended())>
                        <button class="chat-thread__end" on:click=on_end>"End Chat"</button>
                    </Show>
                </header>
                <div class="chat-thread__messages">
                    {move || {
                        messages
                            .get()
                            .into_iter()
                            .map(|m| match m.sender {
                                Sender::User => view! {
                                    <div class="chat-message chat-message--user">{m.message}</div>
                                }
                                .into_any(),
                                Sender::Bot => view! {
                                    <div
                                        class="chat-message chat-message--bot"
                                        inner_html=render_markdown_html(&m.message)
                                    ></div>
                                }
                                .into_any(),
                            })
                            .collect_view()
                    }}
                </div>
                <form class="chat-thread__composer" on:submit=on_send>
                    <input
                        class="chat-thread__input"
                        placeholder="Type your message..."
                        prop:value=move || draft.get()
                        on:input=move |ev| draft.set(event_target_value(&ev))
                    />
                    <button
                        class="chat-thread__send"
                        type="submit"
                        disabled=move || !can_send(&draft.get(), active_chat().as_ref())
                    >
                        "Send"
                    </button>
                </form>
            </section>
        </div>
    }
}
