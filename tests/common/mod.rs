//! Dublês da Google Chat API compartilhados pelos testes de integração.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use gchat_mcp::chat::{ChatApi, ThreadRef};
use gchat_mcp::types::{
    CreateSpaceRequest, ListMessagesOptions, ListSpacesOptions, Membership, Message, Page, Space,
    SortOrder, SpaceType, Thread, User,
};
use gchat_mcp::{GchatError, GchatResult};

/// Google Chat em memória.
#[derive(Default)]
pub struct InMemoryChat {
    messages: Mutex<Vec<Message>>,
    spaces: Mutex<Vec<Space>>,
    members: Mutex<Vec<Membership>>,
    next_id: AtomicUsize,
    list_calls: AtomicUsize,
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 20, 9, 0, 0).unwrap()
}

impl InMemoryChat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Espaço `spaces/{id}` com as mensagens dadas, uma por minuto, em ordem.
    pub fn with_messages(space_id: &str, texts: &[&str]) -> Self {
        let chat = Self::new();
        chat.add_space(space_id, "Test space");
        for text in texts {
            chat.push_message(space_id, text);
        }
        chat
    }

    pub fn add_space(&self, space_id: &str, display_name: &str) {
        self.spaces.lock().unwrap().push(Space {
            name: format!("spaces/{space_id}"),
            display_name: Some(display_name.to_string()),
            space_type: SpaceType::Space,
            space_details: None,
            create_time: Some(base_time().to_rfc3339()),
        });
    }

    pub fn add_member(&self, space_id: &str, user: &str) {
        self.members.lock().unwrap().push(Membership {
            name: format!("spaces/{space_id}/members/{user}"),
            state: Some("JOINED".to_string()),
            role: Some("ROLE_MEMBER".to_string()),
            member: Some(User {
                name: format!("users/{user}"),
                display_name: Some(user.to_string()),
                user_type: Some("HUMAN".to_string()),
            }),
            create_time: None,
        });
    }

    pub fn push_message(&self, space_id: &str, text: &str) -> Message {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let message = Message {
            name: format!("spaces/{space_id}/messages/m{id}"),
            sender: Some(User {
                name: "users/1".to_string(),
                display_name: Some("Tester".to_string()),
                user_type: Some("HUMAN".to_string()),
            }),
            text: text.to_string(),
            create_time: Some((base_time() + Duration::minutes(id as i64)).to_rfc3339()),
            thread: Some(Thread {
                name: format!("spaces/{space_id}/threads/t{id}"),
                thread_key: None,
            }),
        };
        self.messages.lock().unwrap().push(message.clone());
        message
    }

    /// Quantas vezes `list_messages` foi chamado.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn paginate<T: Clone>(items: Vec<T>, page_size: Option<u32>, token: Option<&str>) -> Page<T> {
        let offset: usize = token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let size = page_size.unwrap_or(25) as usize;
        let end = (offset + size).min(items.len());
        let next = if end < items.len() {
            Some(end.to_string())
        } else {
            None
        };

        Page {
            items: items.get(offset..end).map(<[T]>::to_vec).unwrap_or_default(),
            next_page_token: next,
        }
    }

    fn find_space(&self, space: &str) -> GchatResult<Space> {
        self.spaces
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.name == space)
            .cloned()
            .ok_or_else(|| GchatError::NotFound(format!("space {space} not found")))
    }
}

fn created_at(message: &Message) -> Option<DateTime<Utc>> {
    message
        .create_time
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
}

#[async_trait]
impl ChatApi for InMemoryChat {
    async fn send_message(&self, space: &str, text: &str) -> GchatResult<Message> {
        self.find_space(space)?;
        let id = space.trim_start_matches("spaces/");
        Ok(self.push_message(id, text))
    }

    async fn reply_to_thread(
        &self,
        space: &str,
        thread: &str,
        text: &str,
    ) -> GchatResult<Message> {
        let mut message = self.send_message(space, text).await?;
        message.thread = Some(match ThreadRef::parse(thread)? {
            ThreadRef::Name(name) => Thread {
                name,
                thread_key: None,
            },
            ThreadRef::Key(key) => Thread {
                name: format!("{space}/threads/{key}"),
                thread_key: Some(key),
            },
        });

        let mut messages = self.messages.lock().unwrap();
        if let Some(stored) = messages.iter_mut().find(|m| m.name == message.name) {
            *stored = message.clone();
        }
        Ok(message)
    }

    async fn list_messages(
        &self,
        space: &str,
        options: &ListMessagesOptions,
    ) -> GchatResult<Page<Message>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.find_space(space)?;

        let prefix = format!("{space}/messages/");
        let mut items: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.name.starts_with(&prefix))
            .filter(|m| match (options.start_time, created_at(m)) {
                (Some(start), Some(at)) => at > start,
                _ => true,
            })
            .filter(|m| match (options.end_time, created_at(m)) {
                (Some(end), Some(at)) => at < end,
                _ => true,
            })
            .filter(|m| match &options.thread {
                Some(thread) => m.thread.as_ref().map(|t| &t.name) == Some(thread),
                None => true,
            })
            .cloned()
            .collect();

        if options.order == SortOrder::Desc {
            items.reverse();
        }

        Ok(Self::paginate(
            items,
            options.page_size,
            options.page_token.as_deref(),
        ))
    }

    async fn get_message(&self, name: &str) -> GchatResult<Message> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.name == name)
            .cloned()
            .ok_or_else(|| GchatError::NotFound(format!("message {name} not found")))
    }

    async fn update_message(&self, name: &str, text: &str) -> GchatResult<Message> {
        let mut messages = self.messages.lock().unwrap();
        let message = messages
            .iter_mut()
            .find(|m| m.name == name)
            .ok_or_else(|| GchatError::NotFound(format!("message {name} not found")))?;
        message.text = text.to_string();
        Ok(message.clone())
    }

    async fn delete_message(&self, name: &str) -> GchatResult<()> {
        let mut messages = self.messages.lock().unwrap();
        let before = messages.len();
        messages.retain(|m| m.name != name);
        if messages.len() == before {
            return Err(GchatError::NotFound(format!("message {name} not found")));
        }
        Ok(())
    }

    async fn list_spaces(&self, options: &ListSpacesOptions) -> GchatResult<Page<Space>> {
        let items: Vec<Space> = self
            .spaces
            .lock()
            .unwrap()
            .iter()
            .filter(|s| options.space_type.map_or(true, |t| s.space_type == t))
            .cloned()
            .collect();
        Ok(Self::paginate(
            items,
            options.page_size,
            options.page_token.as_deref(),
        ))
    }

    async fn get_space(&self, space: &str) -> GchatResult<Space> {
        self.find_space(space)
    }

    async fn create_space(&self, request: &CreateSpaceRequest) -> GchatResult<Space> {
        let id = format!("new{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.add_space(&id, &request.display_name);
        let mut space = self.find_space(&format!("spaces/{id}"))?;
        space.space_details = request.description.clone().map(|description| {
            gchat_mcp::types::chat::SpaceDetails {
                description: Some(description),
                guidelines: None,
            }
        });
        Ok(space)
    }

    async fn list_members(
        &self,
        space: &str,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> GchatResult<Page<Membership>> {
        self.find_space(space)?;
        let prefix = format!("{space}/members/");
        let items: Vec<Membership> = self
            .members
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.name.starts_with(&prefix))
            .cloned()
            .collect();
        Ok(Self::paginate(items, page_size, page_token))
    }
}

/// API que falha em toda chamada com o erro produzido por `make`.
pub struct FailingChat {
    pub make: fn() -> GchatError,
}

#[async_trait]
impl ChatApi for FailingChat {
    async fn send_message(&self, _: &str, _: &str) -> GchatResult<Message> {
        Err((self.make)())
    }

    async fn reply_to_thread(&self, _: &str, _: &str, _: &str) -> GchatResult<Message> {
        Err((self.make)())
    }

    async fn list_messages(&self, _: &str, _: &ListMessagesOptions) -> GchatResult<Page<Message>> {
        Err((self.make)())
    }

    async fn get_message(&self, _: &str) -> GchatResult<Message> {
        Err((self.make)())
    }

    async fn update_message(&self, _: &str, _: &str) -> GchatResult<Message> {
        Err((self.make)())
    }

    async fn delete_message(&self, _: &str) -> GchatResult<()> {
        Err((self.make)())
    }

    async fn list_spaces(&self, _: &ListSpacesOptions) -> GchatResult<Page<Space>> {
        Err((self.make)())
    }

    async fn get_space(&self, _: &str) -> GchatResult<Space> {
        Err((self.make)())
    }

    async fn create_space(&self, _: &CreateSpaceRequest) -> GchatResult<Space> {
        Err((self.make)())
    }

    async fn list_members(
        &self,
        _: &str,
        _: Option<u32>,
        _: Option<&str>,
    ) -> GchatResult<Page<Membership>> {
        Err((self.make)())
    }
}
