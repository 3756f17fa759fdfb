mod backend;
mod config;
mod controller;
mod escape;
mod markdown;
mod render;
mod sidebar;
mod storage;
mod view;

use iced::{
    widget::{
        button, column, container, horizontal_space, markdown as rich, mouse_area, row,
        scrollable, text, text_input, text_input::Id, Column, Row,
    },
    Element, Length, Task, Theme, Font, Subscription,
    time, clipboard,
    keyboard::{self, Key},
    event::{self, Event as IcedEvent},
    alignment,
    window,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use backend::{Backend, BackendError, HttpBackend, QueryResponse, StatusResponse};
use config::Config;
use controller::{Activity, ChatController};
use render::Role;
use sidebar::SidebarController;
use storage::FileStorage;
use view::{Entry, NetworkBadge, Transcript};

const SIDEBAR_WIDTH: f32 = 280.0;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> iced::Result {
    init_tracing();

    let config = Config::load();
    let size = iced::Size::new(config.window.width as f32, config.window.height as f32);
    let min_size = iced::Size::new(config.window.min_width as f32, config.window.min_height as f32);

    iced::application("AI Agent of Profit", App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window::Settings {
            size,
            min_size: Some(min_size),
            position: window::Position::Centered,
            ..Default::default()
        })
        .run_with(move || App::new(config))
}

#[derive(Debug, Clone)]
enum Message {
    InputChanged(String),
    Submit,
    SuggestionPressed(String),
    QueryFinished(Result<QueryResponse, BackendError>),
    ResetPressed,
    ResetFinished(Result<(), BackendError>),
    StatusChecked(Result<StatusResponse, BackendError>),
    ToggleSidebar,
    MainContentPressed,
    WindowResized(f32),
    Tick,
    CopyReply,
    CopyTranscript,
    LinkClicked(rich::Url),
    Exit,
}

struct App {
    chat: ChatController<Transcript>,
    sidebar: SidebarController,
    storage: FileStorage,
    window_width: f32,
    wallet_address: String,
    suggestions: Vec<String>,
    loading_frame: usize,
    input_id: Id,
    transcript_id: scrollable::Id,
    rich_text: RichTextCache,
}

/// Parsed markdown for each transcript entry, kept in step with the
/// transcript so `view` never re-parses.
#[derive(Default)]
struct RichTextCache {
    generation: u64,
    items: Vec<Vec<rich::Item>>,
}

impl RichTextCache {
    fn sync(&mut self, transcript: &Transcript) {
        let entries = transcript.entries();
        if self.generation != transcript.generation() || self.items.len() > entries.len() {
            self.items.clear();
            self.generation = transcript.generation();
        }

        for entry in &entries[self.items.len()..] {
            let items = match entry {
                Entry::Message(message) if message.role != Role::User => {
                    rich::parse(&message.content).collect()
                }
                // user text is shown verbatim
                _ => Vec::new(),
            };
            self.items.push(items);
        }
    }

    fn get(&self, index: usize) -> &[rich::Item] {
        self.items.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl App {
    fn new(config: Config) -> (Self, Task<Message>) {
        let storage = FileStorage::open(Config::get_config_dir().join("state.json"));
        let window_width = config.window.width as f32;
        let sidebar = SidebarController::initialize(window_width, &storage);

        let http = HttpBackend::new(config.server.base_url);
        tracing::info!("Using agent server at {}", http.base_url());
        let backend: Arc<dyn Backend> = Arc::new(http);

        let mut chat = ChatController::new(Transcript::new(), backend.clone(), config.server.network_name);
        chat.greet();

        let input_id = Id::unique();

        let mut rich_text = RichTextCache::default();
        rich_text.sync(chat.view());

        let app = App {
            chat,
            sidebar,
            storage,
            window_width,
            wallet_address: config.server.wallet_address,
            suggestions: config.ui.suggestions,
            loading_frame: 0,
            input_id: input_id.clone(),
            transcript_id: scrollable::Id::unique(),
            rich_text,
        };

        let status_task = Task::perform(async move { backend.status().await }, Message::StatusChecked);
        let focus_task = text_input::focus(input_id);

        (app, Task::batch([status_task, focus_task]))
    }

    fn perform_query(&self, query: String) -> Task<Message> {
        let backend = self.chat.backend();
        Task::perform(async move { backend.query(&query).await }, Message::QueryFinished)
    }

    fn scroll_task(&mut self) -> Task<Message> {
        if self.chat.view_mut().take_scroll_request() {
            scrollable::snap_to(self.transcript_id.clone(), scrollable::RelativeOffset::END)
        } else {
            Task::none()
        }
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        let task = match message {
            Message::InputChanged(value) => {
                self.chat.set_input(value);
                Task::none()
            }
            Message::Submit => match self.chat.begin_submit() {
                Some(query) => self.perform_query(query),
                None => Task::none(),
            },
            Message::SuggestionPressed(suggestion) => match self.chat.select_suggestion(&suggestion) {
                Some(query) => self.perform_query(query),
                None => Task::none(),
            },
            Message::QueryFinished(result) => {
                self.chat.finish_submit(result);
                Task::none()
            }
            Message::ResetPressed => {
                self.chat.begin_reset();
                let backend = self.chat.backend();
                Task::perform(async move { backend.reset().await }, Message::ResetFinished)
            }
            Message::ResetFinished(result) => {
                self.chat.finish_reset(result);
                Task::none()
            }
            Message::StatusChecked(result) => {
                self.chat.apply_status(result);
                Task::none()
            }
            Message::ToggleSidebar => {
                self.sidebar.toggle(&mut self.storage);
                Task::none()
            }
            Message::MainContentPressed => {
                self.sidebar.on_main_content_click(self.window_width, &mut self.storage);
                Task::none()
            }
            Message::WindowResized(width) => {
                self.window_width = width;
                self.sidebar.on_resize(width);
                Task::none()
            }
            Message::Tick => {
                if self.chat.view().is_loading() {
                    self.loading_frame = (self.loading_frame + 1) % 80; // 10 frames * 8 messages
                }
                Task::none()
            }
            Message::CopyReply => match self.chat.view().last_reply() {
                Some(reply) => clipboard::write(reply.content.clone()),
                None => Task::none(),
            },
            Message::CopyTranscript => clipboard::write(self.chat.view().markup()),
            Message::LinkClicked(url) => {
                if let Err(e) = webbrowser::open(url.as_str()) {
                    tracing::warn!("Failed to open {}: {}", url, e);
                }
                Task::none()
            }
            Message::Exit => iced::exit(),
        };

        self.rich_text.sync(self.chat.view());
        Task::batch([task, self.scroll_task()])
    }

    fn subscription(&self) -> Subscription<Message> {
        let timer = if self.chat.view().is_loading() {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };

        let events = event::listen_with(|event, _status, _id| match event {
            IcedEvent::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(keyboard::key::Named::Escape),
                ..
            }) => Some(Message::Exit),
            IcedEvent::Window(window::Event::Resized(size)) => Some(Message::WindowResized(size.width)),
            _ => None,
        });

        Subscription::batch([timer, events])
    }

    fn view(&self) -> Element<Message> {
        let mut layout = Row::new().height(Length::Fill);
        if !self.sidebar.is_hidden() {
            layout = layout.push(self.sidebar_view());
        }

        let main = mouse_area(self.main_view()).on_press(Message::MainContentPressed);

        container(layout.push(main))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn sidebar_view(&self) -> Element<Message> {
        let badge = match self.chat.view().badge() {
            NetworkBadge::Checking => text("Network: checking...").size(13).style(text::secondary),
            NetworkBadge::Connected(name) => text(format!("Network: {}", name)).size(13).style(text::success),
            NetworkBadge::Disconnected => text("Network: Disconnected").size(13).style(text::danger),
        };

        let suggestions = self.suggestions.iter().fold(Column::new().spacing(6), |col, suggestion| {
            col.push(
                button(text(suggestion.as_str()).size(13))
                    .on_press(Message::SuggestionPressed(suggestion.clone()))
                    .width(Length::Fill)
                    .style(button::secondary),
            )
        });

        container(
            column![
                text("Wallet").size(18),
                text(self.wallet_address.as_str()).size(12).font(Font::MONOSPACE),
                badge,
                button(text("New chat").size(14)).on_press(Message::ResetPressed),
                text("Try asking").size(14),
                suggestions,
            ]
            .spacing(12),
        )
        .padding(15)
        .width(Length::Fixed(SIDEBAR_WIDTH))
        .height(Length::Fill)
        .style(container::rounded_box)
        .into()
    }

    fn main_view(&self) -> Element<Message> {
        let transcript = self.chat.view();

        let toggle_style = if self.sidebar.is_toggle_active() {
            button::primary
        } else {
            button::secondary
        };

        let toolbar = row![
            button(text("Sidebar").size(14))
                .on_press(Message::ToggleSidebar)
                .style(toggle_style),
            horizontal_space(),
            button(text("[Copy HTML]").size(14)).on_press(Message::CopyTranscript),
            button(text("[Copy]").size(14))
                .on_press_maybe(transcript.last_reply().map(|_| Message::CopyReply)),
        ]
        .spacing(10)
        .align_y(alignment::Vertical::Center);

        let entries = transcript
            .entries()
            .iter()
            .enumerate()
            .fold(Column::new().spacing(14), |col, (index, entry)| {
                col.push(entry_view(entry, self.rich_text.get(index)))
            });

        let conversation = scrollable(container(entries).padding(15).width(Length::Fill))
            .id(self.transcript_id.clone())
            .height(Length::Fill);

        let input = text_input("Ask about your wallet, tokens or DeFi...", self.chat.input())
            .on_input(Message::InputChanged)
            .on_submit(Message::Submit)
            .padding(15)
            .size(18)
            .id(self.input_id.clone());

        let input_row = row![input, button(text("Send").size(16)).on_press(Message::Submit).padding(15)]
            .spacing(10)
            .align_y(alignment::Vertical::Center);

        let mut content = column![toolbar, conversation].spacing(10).padding(10);
        if transcript.is_loading() {
            content = content.push(self.loading_view());
        } else if self.chat.activity() == Activity::Resetting {
            content = content.push(text("Resetting conversation...").size(14).style(text::secondary));
        }

        container(content.push(input_row))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn loading_view(&self) -> Element<Message> {
        let loading_frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        let loading_messages = [
            "Consulting the agent...",
            "Reading the chain...",
            "Checking balances...",
            "Crunching market data...",
            "Thinking really hard...",
            "Talking to the MCP tools...",
            "Calculating probabilities...",
            "Waiting for the next block...",
        ];

        let message_idx = (self.loading_frame / 10) % loading_messages.len();
        let spinner_idx = self.loading_frame % loading_frames.len();

        row![
            text(loading_frames[spinner_idx]).size(20),
            text(loading_messages[message_idx]).size(15),
        ]
        .spacing(10)
        .align_y(alignment::Vertical::Center)
        .into()
    }

    fn theme(&self) -> Theme {
        Theme::TokyoNight
    }
}

fn entry_view<'a>(entry: &'a Entry, items: &'a [rich::Item]) -> Element<'a, Message> {
    match entry {
        Entry::Message(message) => {
            let label = text(message.role.label()).size(12);
            let label = match message.role {
                Role::User => label.style(text::primary),
                Role::Assistant => label.style(text::success),
                Role::System => label.style(text::secondary),
            };

            let body: Element<'a, Message> = match message.role {
                Role::User => text(message.content.as_str()).size(15).into(),
                Role::Assistant | Role::System => rich::view(
                    items,
                    rich::Settings::with_text_size(15),
                    rich::Style::from_palette(Theme::TokyoNight.palette()),
                )
                .map(Message::LinkClicked),
            };

            column![label, body].spacing(4).into()
        }
        Entry::ToolCalls(block) => {
            let calls = block.calls.iter().fold(
                Column::new().spacing(8).push(text("Action summary:").size(12).style(text::secondary)),
                |col, call| {
                    col.push(column![
                        text(call.name.as_str()).size(14),
                        text(call.arguments.as_str()).size(12).font(Font::MONOSPACE),
                    ])
                },
            );

            container(calls)
                .padding(10)
                .width(Length::Fill)
                .style(container::rounded_box)
                .into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_message;
    use crate::view::View;

    #[test]
    fn test_rich_text_follows_transcript() {
        let mut transcript = Transcript::new();
        let mut cache = RichTextCache::default();

        transcript.append_message(render_message(Role::User, "**not bold**"));
        transcript.append_message(render_message(Role::Assistant, "You hold **3** tokens"));
        cache.sync(&transcript);

        assert!(cache.get(0).is_empty());
        assert!(!cache.get(1).is_empty());
        assert!(cache.get(5).is_empty());
    }

    #[test]
    fn test_rich_text_rebuilt_after_clear() {
        let mut transcript = Transcript::new();
        let mut cache = RichTextCache::default();

        transcript.append_message(render_message(Role::Assistant, "first"));
        cache.sync(&transcript);
        assert_eq!(cache.items.len(), 1);

        // same length, different content
        transcript.clear_transcript();
        transcript.append_message(render_message(Role::User, "second"));
        cache.sync(&transcript);

        assert_eq!(cache.generation, transcript.generation());
        assert_eq!(cache.items.len(), 1);
        assert!(cache.get(0).is_empty());
    }
}
