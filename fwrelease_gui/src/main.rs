use eframe::{egui, App, Frame, NativeOptions};
use egui::{Align, Color32, Layout, RichText};
use fwrelease_assets::DiskFetcher;
use fwrelease_content::{ContentHost, NodeBody, NodeId, SystemClock};
use fwrelease_loader::ModuleRegistry;
use fwrelease_shell::{NavStateStore, PageId, Shell, RETRY_TAB_ACTION};
use fwrelease_tabs::SlotContent;
use std::path::PathBuf;

const APP_TITLE: &str = "FW Release Workbench";
const DEFAULT_ASSETS_DIR: &str = "assets";
const DEFAULT_STATE_DIR: &str = "state";

/// Launch configuration taken from the command line.
/// 由命令列取得的啟動組態。
#[derive(Debug, Clone, PartialEq, Eq)]
struct LaunchConfig {
    assets_dir: PathBuf,
    state_dir: PathBuf,
    /// Page token, the desktop stand-in for the URL hash fragment.
    hash: Option<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            hash: None,
        }
    }
}

fn parse_launch_args<I: IntoIterator<Item = String>>(args: I) -> LaunchConfig {
    let mut config = LaunchConfig::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--assets" => {
                if let Some(value) = args.next() {
                    config.assets_dir = PathBuf::from(value);
                }
            }
            "--state-dir" => {
                if let Some(value) = args.next() {
                    config.state_dir = PathBuf::from(value);
                }
            }
            "--page" => {
                if let Some(value) = args.next() {
                    config.hash = Some(value.trim_start_matches('#').to_string());
                }
            }
            other if other.starts_with('#') => {
                config.hash = Some(other.trim_start_matches('#').to_string());
            }
            _ => {}
        }
    }
    config
}

/// A pending change recorded while rendering; applied after the pass so
/// the content host is not mutated mid-walk.
enum PendingEdit {
    SetValue(NodeId, String),
    SetSelected(NodeId, Option<usize>),
    SetChecked(NodeId, bool),
}

struct WorkbenchApp {
    shell: Shell,
    dark_mode: bool,
    sidebar_collapsed: bool,
    visuals_applied: bool,
}

impl WorkbenchApp {
    fn new(config: &LaunchConfig) -> Self {
        let mut registry = ModuleRegistry::new();
        fwrelease_modules::register_all(&mut registry).expect("module factories register once");

        let store = NavStateStore::in_dir(&config.state_dir);
        let mut shell = Shell::new(
            registry,
            Box::new(DiskFetcher::new(&config.assets_dir)),
            Box::new(SystemClock::new()),
            store,
            config.hash.as_deref(),
        )
        .expect("static page tables are valid");
        shell.start();

        Self {
            shell,
            dark_mode: true,
            sidebar_collapsed: false,
            visuals_applied: false,
        }
    }

    fn apply_visuals(&mut self, ctx: &egui::Context) {
        ctx.set_visuals(if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });
        self.visuals_applied = true;
    }

    fn show_sidebar(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("sidebar")
            .default_width(if self.sidebar_collapsed { 48.0 } else { 190.0 })
            .resizable(false)
            .show(ctx, |ui| {
                let toggle_label = if self.sidebar_collapsed { "»" } else { "« Collapse" };
                if ui.button(toggle_label).clicked() {
                    self.sidebar_collapsed = !self.sidebar_collapsed;
                }
                ui.separator();

                let active = self.shell.active_page();
                for page in PageId::ALL {
                    let label = if self.sidebar_collapsed {
                        page.title().chars().take(2).collect::<String>()
                    } else {
                        page.title().to_string()
                    };
                    if ui
                        .selectable_label(active == page.index(), label)
                        .clicked()
                    {
                        if let Err(err) = self.shell.show_main_page(page.index()) {
                            tracing::warn!(error = %err, "page switch rejected");
                        }
                    }
                }

                ui.separator();
                let mode_label = if self.dark_mode { "☀ Light mode" } else { "🌙 Dark mode" };
                if ui.button(mode_label).clicked() {
                    self.dark_mode = !self.dark_mode;
                    self.visuals_applied = false;
                }
            });
    }

    fn show_tab_strip(&mut self, ui: &mut egui::Ui) {
        let active_page = self.shell.active_page();
        let active_tab = self.shell.active_tab_index();
        let names: Vec<String> = self.shell.pages()[active_page]
            .tabs
            .tabs()
            .iter()
            .map(|tab| tab.name.clone())
            .collect();

        let mut clicked = None;
        ui.horizontal(|ui| {
            for (index, name) in names.iter().enumerate() {
                if ui
                    .selectable_label(index == active_tab, RichText::new(name).strong())
                    .clicked()
                {
                    clicked = Some(index);
                }
            }
        });
        if let Some(index) = clicked {
            if let Err(err) = self.shell.select_tab(index) {
                tracing::warn!(error = %err, "tab selection rejected");
            }
        }
    }

    fn show_content(&mut self, ui: &mut egui::Ui) {
        let mut actions: Vec<String> = Vec::new();
        let mut edits: Vec<PendingEdit> = Vec::new();

        match self.shell.active_slot() {
            SlotContent::Placeholder(message) => {
                ui.add_space(24.0);
                ui.vertical_centered(|ui| {
                    ui.spinner();
                    ui.label(message);
                });
            }
            SlotContent::Failed { stage, message } => {
                ui.add_space(24.0);
                ui.vertical_centered(|ui| {
                    ui.colored_label(
                        Color32::from_rgb(239, 68, 68),
                        format!("Failed to load the {}", stage.describe()),
                    );
                    ui.label(message);
                    if ui.button("🔄 Reload tab").clicked() {
                        actions.push(RETRY_TAB_ACTION.to_string());
                    }
                });
            }
            SlotContent::Loaded(host) => {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for root in host.roots().to_vec() {
                        render_node(ui, host, root, &mut actions, &mut edits);
                    }
                });
            }
        }

        if let Some(host) = self.shell.active_host_mut() {
            for edit in edits {
                let result = match edit {
                    PendingEdit::SetValue(id, value) => host.set_value(id, value),
                    PendingEdit::SetSelected(id, index) => host.set_selected(id, index),
                    PendingEdit::SetChecked(id, value) => host.set_checked(id, value),
                };
                if let Err(err) = result {
                    tracing::warn!(error = %err, "widget edit rejected");
                }
            }
        }
        for action in actions {
            self.shell.fire_action(&action);
        }
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar")
            .resizable(false)
            .exact_height(24.0)
            .show(ctx, |ui| {
                ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                    ui.label(self.shell.active_page_id().title());
                    ui.separator();
                    let tab = self.shell.active_tab_index();
                    let name = &self.shell.pages()[self.shell.active_page()].tabs.tabs()[tab].name;
                    ui.label(name);
                    if let Some(hash) = self.shell.hash() {
                        ui.separator();
                        ui.label(format!("#{hash}"));
                    }
                });
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    ui.label(self.shell.last_event());
                });
            });
    }
}

/// Renders one content node and queues edits/actions for after the pass.
fn render_node(
    ui: &mut egui::Ui,
    host: &ContentHost,
    id: NodeId,
    actions: &mut Vec<String>,
    edits: &mut Vec<PendingEdit>,
) {
    let Some(node) = host.node(id) else { return };
    let action = node.binding.clone();
    let children: Vec<NodeId> = node.children().to_vec();

    match &node.body {
        NodeBody::Section { title } => {
            ui.add_space(8.0);
            ui.heading(title);
            ui.separator();
        }
        NodeBody::Label(text) => {
            ui.label(text);
        }
        NodeBody::Text(text) => {
            if !text.is_empty() {
                ui.label(RichText::new(text).monospace());
            }
        }
        NodeBody::Input { label, value } => {
            let mut buffer = value.clone();
            ui.horizontal(|ui| {
                if !label.is_empty() {
                    ui.label(label);
                }
                let response = ui.add(
                    egui::TextEdit::singleline(&mut buffer).desired_width(f32::INFINITY),
                );
                if response.changed() {
                    edits.push(PendingEdit::SetValue(id, buffer.clone()));
                    if let Some(action) = &action {
                        actions.push(action.clone());
                    }
                }
            });
        }
        NodeBody::Select {
            label,
            options,
            selected,
        } => {
            let mut index = *selected;
            let current = index
                .and_then(|idx| options.get(idx))
                .map(|option| option.label.clone())
                .unwrap_or_else(|| "—".to_string());
            ui.horizontal(|ui| {
                if !label.is_empty() {
                    ui.label(label);
                }
                egui::ComboBox::from_id_source(id)
                    .width(240.0)
                    .selected_text(current)
                    .show_ui(ui, |ui| {
                        for (idx, option) in options.iter().enumerate() {
                            if ui
                                .selectable_label(index == Some(idx), &option.label)
                                .clicked()
                            {
                                index = Some(idx);
                            }
                        }
                    });
            });
            if index != *selected {
                edits.push(PendingEdit::SetSelected(id, index));
                if let Some(action) = &action {
                    actions.push(action.clone());
                }
            }
        }
        NodeBody::Checkbox { label, checked } => {
            let mut value = *checked;
            if ui.checkbox(&mut value, label).changed() {
                edits.push(PendingEdit::SetChecked(id, value));
                if let Some(action) = &action {
                    actions.push(action.clone());
                }
            }
        }
        NodeBody::Button { label, enabled } => {
            if ui.add_enabled(*enabled, egui::Button::new(label)).clicked() {
                if let Some(action) = &action {
                    actions.push(action.clone());
                }
            }
        }
        NodeBody::Table { headers, rows } => {
            egui::Grid::new(id).striped(true).show(ui, |ui| {
                if !headers.is_empty() {
                    for header in headers {
                        ui.label(RichText::new(header).strong());
                    }
                    ui.end_row();
                }
                for row in rows {
                    for cell in row {
                        ui.label(cell);
                    }
                    ui.end_row();
                }
            });
        }
        NodeBody::Progress { fraction, message } => {
            ui.add(egui::ProgressBar::new(*fraction).text(message.clone()));
        }
    }

    if !children.is_empty() {
        ui.indent(id, |ui| {
            for child in children {
                render_node(ui, host, child, actions, edits);
            }
        });
    }
}

impl App for WorkbenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        if !self.visuals_applied {
            self.apply_visuals(ctx);
        }
        self.shell.tick();

        self.show_sidebar(ctx);
        self.show_status_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_tab_strip(ui);
            ui.separator();
            self.show_content(ui);
        });

        if let Some(text) = self.shell.take_clipboard() {
            ctx.output_mut(|output| output.copied_text = text);
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = parse_launch_args(std::env::args().skip(1));
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |_cc| Box::new(WorkbenchApp::new(&config))),
    )
}
