// The showcase page: hero banner, about photo strip, and one tabbed panel
// per rental unit. Every unit panel carries an info card (name, meta,
// description, tag chips, optional booking link) next to a photo grid whose
// cells open the lightbox.

use gtk4::prelude::*;
use gtk4::{
    Align, Box as GtkBox, Button, FlowBox, Label, LinkButton, Orientation, Overlay, Picture,
    SelectionMode, Stack, StackTransitionType, Widget,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::data::resolve_image;
use crate::gallery::unit_image_paths;
use crate::models::{AboutImage, ShowcaseData, Unit};
use crate::ui::lightbox::Lightbox;
use crate::ui::loading::{decode_downscaled, texture_from_rgba};

/// Longest decoded side for the hero banner.
const HERO_DECODE_SIZE: u32 = 1600;
/// Longest decoded side for about-strip and grid-cell photos.
const CARD_DECODE_SIZE: u32 = 560;
const HERO_HEIGHT: i32 = 340;
const ABOUT_PHOTO_W: i32 = 220;
const ABOUT_PHOTO_H: i32 = 150;
const ABOUT_PHOTO_TALL_H: i32 = 230;
const GRID_CELL_W: i32 = 220;
const GRID_CELL_H: i32 = 150;

/// Which unit tab is active. One tab is always active; re-activating the
/// current tab is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabState {
    count: usize,
    active: usize,
}

impl TabState {
    pub fn new(count: usize) -> Self {
        Self { count, active: 0 }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    /// Returns true when the activation changed the selection.
    pub fn activate(&mut self, index: usize) -> bool {
        if index >= self.count || index == self.active {
            return false;
        }
        self.active = index;
        true
    }
}

/// Reveal state of a unit's hidden tag chips.
#[derive(Debug, Clone, Copy)]
pub struct TagToggleState {
    hidden_count: usize,
    revealed: bool,
}

impl TagToggleState {
    pub fn new(hidden_count: usize) -> Self {
        Self {
            hidden_count,
            revealed: false,
        }
    }

    pub fn revealed(&self) -> bool {
        self.revealed
    }

    pub fn toggle(&mut self) {
        self.revealed = !self.revealed;
    }

    /// Button label for the current state.
    pub fn label(&self) -> String {
        if self.revealed {
            "Weniger".to_string()
        } else {
            format!("+{}", self.hidden_count)
        }
    }
}

pub struct ShowcasePage {
    base_dir: PathBuf,
    root: GtkBox,
    lightbox: Lightbox,
    tab_state: RefCell<TabState>,
    tab_buttons: RefCell<Vec<Button>>,
    panel_stack: RefCell<Option<Stack>>,
    self_weak: RefCell<std::rc::Weak<Self>>,
}

impl ShowcasePage {
    pub fn new(base_dir: PathBuf, data: &ShowcaseData, lightbox: Lightbox) -> Rc<Self> {
        let root = GtkBox::new(Orientation::Vertical, 0);
        root.add_css_class("showcase");

        let page = Rc::new(Self {
            base_dir,
            root,
            lightbox,
            tab_state: RefCell::new(TabState::new(data.units.len().max(1))),
            tab_buttons: RefCell::new(Vec::new()),
            panel_stack: RefCell::new(None),
            self_weak: RefCell::new(std::rc::Weak::new()),
        });
        *page.self_weak.borrow_mut() = Rc::downgrade(&page);

        page.build_hero(&data.hero_image);
        page.build_about_strip(&data.about_images);
        page.build_units(&data.units);
        page
    }

    pub fn widget(&self) -> Widget {
        self.root.clone().upcast()
    }

    /// Decode an image reference into a downscaled picture widget. Missing
    /// or broken images get an empty placeholder frame instead of an error.
    fn card_picture(&self, reference: &str, max_size: u32) -> Picture {
        let picture = Picture::new();
        picture.set_can_shrink(true);
        picture.set_content_fit(gtk4::ContentFit::Cover);

        match resolve_image(&self.base_dir, reference)
            .and_then(|path| decode_downscaled(&path, max_size))
        {
            Ok(image) => {
                if let Some(texture) = texture_from_rgba(&image) {
                    picture.set_paintable(Some(&texture));
                }
            }
            Err(err) => {
                tracing::warn!(reference, error = ?err, "Showcase image unavailable");
                picture.add_css_class("missing");
            }
        }
        picture
    }

    fn path_picture(&self, path: &Path, max_size: u32) -> Picture {
        let picture = Picture::new();
        picture.set_can_shrink(true);
        picture.set_content_fit(gtk4::ContentFit::Cover);
        match decode_downscaled(path, max_size) {
            Ok(image) => {
                if let Some(texture) = texture_from_rgba(&image) {
                    picture.set_paintable(Some(&texture));
                }
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = ?err, "Grid image unavailable");
                picture.add_css_class("missing");
            }
        }
        picture
    }

    fn build_hero(&self, hero_image: &str) {
        let hero = self.card_picture(hero_image, HERO_DECODE_SIZE);
        hero.add_css_class("hero");
        hero.set_height_request(HERO_HEIGHT);
        hero.set_hexpand(true);
        self.root.append(&hero);
    }

    fn build_about_strip(&self, about_images: &[AboutImage]) {
        if about_images.is_empty() {
            return;
        }

        let strip = GtkBox::new(Orientation::Horizontal, 12);
        strip.add_css_class("about-strip");
        strip.set_margin_start(24);
        strip.set_margin_end(24);
        strip.set_margin_top(24);
        strip.set_margin_bottom(24);
        strip.set_halign(Align::Center);

        for about in about_images {
            let picture = self.card_picture(&about.src, CARD_DECODE_SIZE);
            picture.add_css_class("about-photo");
            if !about.alt.is_empty() {
                picture.set_tooltip_text(Some(&about.alt));
            }
            let height = if about.tall {
                picture.add_css_class("tall");
                ABOUT_PHOTO_TALL_H
            } else {
                ABOUT_PHOTO_H
            };
            picture.set_size_request(ABOUT_PHOTO_W, height);
            strip.append(&picture);
        }
        self.root.append(&strip);
    }

    fn build_units(&self, units: &[Unit]) {
        if units.is_empty() {
            tracing::warn!("Showcase data contains no units");
            return;
        }

        let section = GtkBox::new(Orientation::Vertical, 16);
        section.add_css_class("units");
        section.set_margin_start(24);
        section.set_margin_end(24);
        section.set_margin_bottom(32);

        let tab_bar = GtkBox::new(Orientation::Horizontal, 8);
        tab_bar.add_css_class("tab-bar");
        tab_bar.set_halign(Align::Center);

        let stack = Stack::new();
        stack.set_transition_type(StackTransitionType::Crossfade);
        stack.set_hhomogeneous(true);

        for (i, unit) in units.iter().enumerate() {
            let tab = Button::with_label(&unit.name);
            tab.add_css_class("tab");
            if i == 0 {
                tab.add_css_class("active");
            }

            let page_weak = self.self_weak.borrow().clone();
            tab.connect_clicked(move |_| {
                if let Some(page) = page_weak.upgrade() {
                    page.activate_tab(i);
                }
            });

            tab_bar.append(&tab);
            self.tab_buttons.borrow_mut().push(tab);

            let panel = self.build_unit_panel(unit);
            stack.add_named(&panel, Some(&i.to_string()));
        }
        stack.set_visible_child_name("0");

        section.append(&tab_bar);
        section.append(&stack);
        *self.panel_stack.borrow_mut() = Some(stack);
        self.root.append(&section);
    }

    fn activate_tab(&self, index: usize) {
        if !self.tab_state.borrow_mut().activate(index) {
            return;
        }
        for (i, tab) in self.tab_buttons.borrow().iter().enumerate() {
            if i == index {
                tab.add_css_class("active");
            } else {
                tab.remove_css_class("active");
            }
        }
        if let Some(stack) = self.panel_stack.borrow().as_ref() {
            stack.set_visible_child_name(&index.to_string());
        }
    }

    fn build_unit_panel(&self, unit: &Unit) -> GtkBox {
        let panel = GtkBox::new(Orientation::Horizontal, 24);
        panel.add_css_class("unit-panel");

        let info = self.build_info_card(unit);
        info.set_hexpand(false);
        info.set_size_request(320, -1);

        let grid = self.build_photo_grid(unit);
        grid.set_hexpand(true);

        panel.append(&info);
        panel.append(&grid);
        panel
    }

    fn build_info_card(&self, unit: &Unit) -> GtkBox {
        let card = GtkBox::new(Orientation::Vertical, 8);
        card.add_css_class("unit-info");

        let name = Label::new(Some(&unit.name));
        name.add_css_class("unit-name");
        name.set_xalign(0.0);
        card.append(&name);

        if !unit.meta.is_empty() {
            let meta = Label::new(Some(&unit.meta));
            meta.add_css_class("unit-meta");
            meta.set_xalign(0.0);
            card.append(&meta);
        }

        if !unit.description.is_empty() {
            let description = Label::new(Some(&unit.description));
            description.add_css_class("unit-description");
            description.set_xalign(0.0);
            description.set_wrap(true);
            card.append(&description);
        }

        if !unit.tags.is_empty() || !unit.hidden_tags.is_empty() {
            card.append(&self.build_tag_chips(unit));
        }

        if let Some(cta) = &unit.cta {
            let link = LinkButton::with_label(&cta.href, &cta.label);
            link.add_css_class("unit-cta");
            link.set_halign(Align::Start);
            card.append(&link);
        }
        card
    }

    /// Tag chips: visible tags always shown, hidden tags behind a "+N"
    /// toggle that flips to "Weniger" once revealed.
    fn build_tag_chips(&self, unit: &Unit) -> FlowBox {
        let chips = FlowBox::new();
        chips.add_css_class("unit-tags");
        chips.set_selection_mode(SelectionMode::None);
        chips.set_max_children_per_line(4);
        chips.set_column_spacing(6);
        chips.set_row_spacing(6);
        chips.set_halign(Align::Start);

        for tag in &unit.tags {
            let chip = Label::new(Some(tag));
            chip.add_css_class("tag");
            chips.append(&chip);
        }

        if unit.hidden_tags.is_empty() {
            return chips;
        }

        let mut hidden_chips = Vec::new();
        for tag in &unit.hidden_tags {
            let chip = Label::new(Some(tag));
            chip.add_css_class("tag");
            chips.append(&chip);
            // FlowBox wraps children; hide the wrapper so the cell collapses.
            if let Some(parent) = chip.parent() {
                parent.set_visible(false);
                hidden_chips.push(parent);
            }
        }

        let state = std::cell::Cell::new(TagToggleState::new(unit.hidden_tags.len()));
        let toggle = Button::with_label(&state.get().label());
        toggle.add_css_class("tag");
        toggle.add_css_class("tag-toggle");
        toggle.connect_clicked(move |button| {
            let mut current = state.get();
            current.toggle();
            for chip in &hidden_chips {
                chip.set_visible(current.revealed());
            }
            button.set_label(&current.label());
            state.set(current);
        });
        chips.append(&toggle);
        chips
    }

    /// Photo grid: up to five cells in display order. Each cell opens the
    /// lightbox at its own index; units with more photos get an
    /// "Alle N Fotos" overlay on the last cell that opens at the start.
    fn build_photo_grid(&self, unit: &Unit) -> FlowBox {
        let grid = FlowBox::new();
        grid.add_css_class("photo-grid");
        grid.set_selection_mode(SelectionMode::None);
        grid.set_max_children_per_line(3);
        grid.set_column_spacing(10);
        grid.set_row_spacing(10);

        let items = unit_image_paths(&self.base_dir, &unit.folder, unit.total_images);
        if items.is_empty() {
            tracing::warn!(unit = %unit.name, folder = %unit.folder, "No images for unit");
            return grid;
        }

        let shown = unit.grid_count().min(items.len());
        for (i, path) in items.iter().take(shown).enumerate() {
            let picture = self.path_picture(path, CARD_DECODE_SIZE);
            picture.set_size_request(GRID_CELL_W, GRID_CELL_H);

            let cell = Button::new();
            cell.add_css_class("photo-cell");

            let is_last = i + 1 == shown;
            if is_last && unit.has_more_photos() {
                let overlay = Overlay::new();
                overlay.set_child(Some(&picture));

                let more = Label::new(Some(&format!("Alle {} Fotos", items.len())));
                more.add_css_class("photo-more");
                more.set_halign(Align::Center);
                more.set_valign(Align::Center);
                overlay.add_overlay(&more);
                cell.set_child(Some(&overlay));

                let page_weak = self.self_weak.borrow().clone();
                let all = items.clone();
                cell.connect_clicked(move |_| {
                    if let Some(page) = page_weak.upgrade() {
                        page.lightbox.open(all.clone(), 0);
                    }
                });
            } else {
                cell.set_child(Some(&picture));

                let page_weak = self.self_weak.borrow().clone();
                let all = items.clone();
                cell.connect_clicked(move |_| {
                    if let Some(page) = page_weak.upgrade() {
                        page.lightbox.open(all.clone(), i);
                    }
                });
            }
            grid.append(&cell);
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_state_starts_at_first() {
        let state = TabState::new(3);
        assert_eq!(state.active(), 0);
    }

    #[test]
    fn test_tab_activation_changes_selection_once() {
        let mut state = TabState::new(3);
        assert!(state.activate(2));
        assert_eq!(state.active(), 2);
        // Re-activating the current tab is a no-op.
        assert!(!state.activate(2));
        assert_eq!(state.active(), 2);
    }

    #[test]
    fn test_tab_activation_rejects_out_of_range() {
        let mut state = TabState::new(2);
        assert!(!state.activate(5));
        assert_eq!(state.active(), 0);
    }

    #[test]
    fn test_tag_toggle_label_flips() {
        let mut state = TagToggleState::new(4);
        assert_eq!(state.label(), "+4");
        assert!(!state.revealed());

        state.toggle();
        assert_eq!(state.label(), "Weniger");
        assert!(state.revealed());

        state.toggle();
        assert_eq!(state.label(), "+4");
    }
}
