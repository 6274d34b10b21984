// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use crate::error::{Error, Result};
use crate::models::Tab;
use tracing::debug;

/// How to undo one drilldown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationFrame {
    Categories {
        tab: Tab,
        category_id: String,
        previous_category_id: String,
    },
    SeriesItems {
        tab: Tab,
        series_id: String,
        series_name: String,
    },
}

/// Which view is active. Derived from the back stack, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    TabRoot(Tab),
    CategoryDrilldown {
        tab: Tab,
        category_id: String,
    },
    SeriesEpisodes {
        tab: Tab,
        category_id: String,
        series_id: String,
        series_name: String,
    },
}

impl NavState {
    pub fn tab(&self) -> Tab {
        match self {
            NavState::TabRoot(tab)
            | NavState::CategoryDrilldown { tab, .. }
            | NavState::SeriesEpisodes { tab, .. } => *tab,
        }
    }
}

/// What a sidebar click means at the current depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarAction {
    /// Live TV: re-filter channels in place
    Filter,
    /// Movies/series at the root: enter the category
    Drilldown,
    /// Movies/series already drilled down: move the highlight only
    Highlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    tab: Tab,
    selected_category: String,
    stack: Vec<NavigationFrame>,
    search: Option<String>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Tab::Live)
    }
}

impl Navigator {
    pub fn new(tab: Tab) -> Self {
        Self {
            tab,
            selected_category: tab.all_category_id().to_string(),
            stack: Vec::new(),
            search: None,
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// Sidebar highlight. For live TV this is also the channel filter.
    pub fn selected_category(&self) -> &str {
        &self.selected_category
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn stack(&self) -> &[NavigationFrame] {
        &self.stack
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    pub fn state(&self) -> NavState {
        let drilled_category = self.stack.iter().rev().find_map(|frame| match frame {
            NavigationFrame::Categories { category_id, .. } => Some(category_id.clone()),
            NavigationFrame::SeriesItems { .. } => None,
        });

        match self.stack.last() {
            None => NavState::TabRoot(self.tab),
            Some(NavigationFrame::Categories { category_id, .. }) => NavState::CategoryDrilldown {
                tab: self.tab,
                category_id: category_id.clone(),
            },
            Some(NavigationFrame::SeriesItems {
                series_id,
                series_name,
                ..
            }) => NavState::SeriesEpisodes {
                tab: self.tab,
                category_id: drilled_category.unwrap_or_else(|| self.tab.all_category_id().into()),
                series_id: series_id.clone(),
                series_name: series_name.clone(),
            },
        }
    }

    pub fn sidebar_action(&self) -> SidebarAction {
        if !self.tab.has_drilldown() {
            SidebarAction::Filter
        } else if self.stack.is_empty() {
            SidebarAction::Drilldown
        } else {
            SidebarAction::Highlight
        }
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        debug!("Switching tab: {} -> {}", self.tab, tab);
        *self = Self::new(tab);
    }

    pub fn drill_into_category(&mut self, category_id: &str) -> Result<()> {
        if !self.tab.has_drilldown() {
            return Err(Error::InvalidTransition(format!(
                "{} has no category drilldown",
                self.tab
            )));
        }
        if !self.stack.is_empty() {
            return Err(Error::InvalidTransition(
                "already inside a category".to_string(),
            ));
        }

        self.stack.push(NavigationFrame::Categories {
            tab: self.tab,
            category_id: category_id.to_string(),
            previous_category_id: self.selected_category.clone(),
        });
        self.selected_category = category_id.to_string();
        self.search = None;
        debug!("Drilled into category {} ({})", category_id, self.tab);
        Ok(())
    }

    pub fn drill_into_series(&mut self, series_id: &str, series_name: &str) -> Result<()> {
        if self.tab != Tab::Series {
            return Err(Error::InvalidTransition(format!(
                "{} has no series episodes",
                self.tab
            )));
        }
        if !matches!(self.state(), NavState::CategoryDrilldown { .. }) {
            return Err(Error::InvalidTransition(
                "series can only be opened from a category".to_string(),
            ));
        }

        self.stack.push(NavigationFrame::SeriesItems {
            tab: self.tab,
            series_id: series_id.to_string(),
            series_name: series_name.to_string(),
        });
        self.search = None;
        debug!("Drilled into series {} ({})", series_id, series_name);
        Ok(())
    }

    /// Pop one frame. Returns `None` (and changes nothing) at the root.
    pub fn go_back(&mut self) -> Option<NavigationFrame> {
        let frame = self.stack.pop()?;

        if let NavigationFrame::Categories {
            previous_category_id,
            ..
        } = &frame
        {
            self.selected_category = previous_category_id.clone();
        }
        self.search = None;

        debug!("Navigated back, depth now {}", self.stack.len());
        Some(frame)
    }

    /// Live TV re-filter, or highlight-only while drilled down. Never pushes.
    pub fn select_category(&mut self, category_id: &str) -> Result<()> {
        if self.sidebar_action() == SidebarAction::Drilldown {
            return Err(Error::InvalidTransition(
                "selecting a category at the root enters it".to_string(),
            ));
        }
        self.selected_category = category_id.to_string();
        Ok(())
    }

    pub fn set_search(&mut self, term: Option<String>) {
        self.search = term;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_tab_root() {
        let nav = Navigator::new(Tab::Movies);
        assert_eq!(nav.state(), NavState::TabRoot(Tab::Movies));
        assert_eq!(nav.selected_category(), "*");
        assert_eq!(Navigator::default().selected_category(), "all");
    }

    #[test]
    fn go_back_on_empty_stack_is_noop() {
        let mut nav = Navigator::new(Tab::Series);
        let before = nav.clone();
        assert_eq!(nav.go_back(), None);
        assert_eq!(nav, before);
    }

    #[test]
    fn switching_tabs_resets_stack() {
        let mut nav = Navigator::new(Tab::Movies);
        nav.drill_into_category("news").unwrap();
        nav.switch_tab(Tab::Movies);
        nav.switch_tab(Tab::Live);
        assert_eq!(nav.go_back(), None);
        assert_eq!(nav.depth(), 0);
        assert_eq!(nav.state(), NavState::TabRoot(Tab::Live));
    }

    #[test]
    fn drilldown_pushes_exactly_one_frame() {
        let mut nav = Navigator::new(Tab::Movies);
        assert_eq!(nav.sidebar_action(), SidebarAction::Drilldown);
        nav.drill_into_category("news").unwrap();
        assert_eq!(
            nav.state(),
            NavState::CategoryDrilldown {
                tab: Tab::Movies,
                category_id: "news".into()
            }
        );
        assert_eq!(nav.depth(), 1);

        // Same sidebar click now only moves the highlight
        assert_eq!(nav.sidebar_action(), SidebarAction::Highlight);
        nav.select_category("sports").unwrap();
        assert_eq!(nav.depth(), 1);
        assert_eq!(nav.selected_category(), "sports");
        assert_eq!(
            nav.state(),
            NavState::CategoryDrilldown {
                tab: Tab::Movies,
                category_id: "news".into()
            }
        );
        assert!(nav.drill_into_category("sports").is_err());
    }

    #[test]
    fn back_restores_previous_category() {
        let mut nav = Navigator::new(Tab::Movies);
        nav.drill_into_category("7").unwrap();
        nav.set_search(Some("term".into()));

        let frame = nav.go_back().unwrap();
        assert!(matches!(frame, NavigationFrame::Categories { .. }));
        assert_eq!(nav.state(), NavState::TabRoot(Tab::Movies));
        assert_eq!(nav.selected_category(), "*");
        assert!(!nav.is_searching());
    }

    #[test]
    fn series_episodes_back_to_category() {
        let mut nav = Navigator::new(Tab::Series);
        assert!(nav.drill_into_series("1", "Foo").is_err());

        nav.drill_into_category("3").unwrap();
        nav.drill_into_series("42", "Foo").unwrap();
        assert_eq!(
            nav.state(),
            NavState::SeriesEpisodes {
                tab: Tab::Series,
                category_id: "3".into(),
                series_id: "42".into(),
                series_name: "Foo".into()
            }
        );
        assert!(nav.drill_into_series("43", "Bar").is_err());

        nav.go_back();
        assert_eq!(
            nav.state(),
            NavState::CategoryDrilldown {
                tab: Tab::Series,
                category_id: "3".into()
            }
        );
    }

    #[test]
    fn live_tab_filters_in_place() {
        let mut nav = Navigator::new(Tab::Live);
        assert_eq!(nav.sidebar_action(), SidebarAction::Filter);
        nav.select_category("5").unwrap();
        assert_eq!(nav.selected_category(), "5");
        assert_eq!(nav.depth(), 0);
        assert!(nav.drill_into_category("5").is_err());
    }

    #[test]
    fn movies_cannot_open_series() {
        let mut nav = Navigator::new(Tab::Movies);
        nav.drill_into_category("1").unwrap();
        assert!(nav.drill_into_series("2", "x").is_err());
        assert!(nav.select_category("1").is_ok());
        nav.go_back();
        assert!(nav.select_category("1").is_err());
    }
}
