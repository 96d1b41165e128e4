//! Slot catalog for the booking core.
//!
//! Holds the recurring slot templates offered to one student and projects
//! them onto concrete dates. Fetching walks the paginated slot listing and
//! keeps only rows the backend marks as available.
//!
//! ## Display order
//!
//! Templates are shown by ascending start time. Templates without a start
//! time go last. Ties keep the order the backend sent them in.

use anyhow::Result;
use chrono::NaiveDate;
use log::{debug, info, warn};
use shared::DateRangeQuery;
use std::collections::{BTreeMap, HashMap};

use crate::backend::domain::calendar::WeekdayCalendar;
use crate::backend::domain::models::slot::{GroupedSlot, SlotOccurrence, SlotTemplate};
use crate::backend::domain::models::weekday::WeekdayKey;
use crate::backend::io::mappers::SlotMapper;
use crate::backend::storage::SlotSource;

pub const DEFAULT_PAGE_SIZE: u32 = 200;
/// Upper bound on pages fetched per listing (about 10 000 rows)
pub const DEFAULT_MAX_PAGES: u32 = 50;

/// Paging limits for the slot listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPaging {
    pub page_size: u32,
    pub max_pages: u32,
}

impl Default for SlotPaging {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// The bookable slot templates of one student
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotCatalog {
    templates: Vec<SlotTemplate>,
}

impl SlotCatalog {
    pub fn new(templates: Vec<SlotTemplate>) -> Self {
        Self { templates }
    }

    /// Fetch every available template for a student.
    ///
    /// Any page error aborts the whole fetch; a partial catalog is never
    /// returned. Rows that cannot be mapped are skipped.
    pub async fn fetch<S: SlotSource + ?Sized>(
        source: &S,
        student_id: &str,
        date_range: Option<&DateRangeQuery>,
        paging: SlotPaging,
    ) -> Result<Self> {
        let mut templates = Vec::new();
        let mut page = 1;

        loop {
            let slot_page = source
                .list_available_slots(student_id, page, paging.page_size, date_range)
                .await?;
            debug!(
                "Slot page {} for student {}: {} rows, has_next_page={}",
                page,
                student_id,
                slot_page.items.len(),
                slot_page.has_next_page
            );

            for row in slot_page.items {
                if !SlotMapper::is_available(&row) {
                    continue;
                }
                match SlotMapper::to_domain(row) {
                    Ok(template) => templates.push(template),
                    Err(e) => warn!("Skipping slot row: {:#}", e),
                }
            }

            if !slot_page.has_next_page {
                break;
            }
            if page >= paging.max_pages {
                warn!(
                    "Slot listing for student {} still has pages after {} pages; stopping",
                    student_id, paging.max_pages
                );
                break;
            }
            page += 1;
        }

        info!("Fetched {} available slot templates for student {}", templates.len(), student_id);
        Ok(Self { templates })
    }

    pub fn templates(&self) -> &[SlotTemplate] {
        &self.templates
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn template(&self, template_id: &str) -> Option<&SlotTemplate> {
        self.templates.iter().find(|t| t.id == template_id)
    }

    /// Stable sort by start time, unknown start times last
    pub fn sort_for_display(templates: &mut [SlotTemplate]) {
        templates.sort_by_key(|t| (t.start_minutes().is_none(), t.start_minutes()));
    }

    /// All seven weekdays are present in the result, possibly empty
    pub fn group_by_weekday(&self) -> BTreeMap<WeekdayKey, Vec<SlotTemplate>> {
        let mut grouped: BTreeMap<WeekdayKey, Vec<SlotTemplate>> =
            WeekdayKey::ALL.iter().map(|w| (*w, Vec::new())).collect();

        for template in &self.templates {
            grouped.entry(template.weekday).or_default().push(template.clone());
        }
        for templates in grouped.values_mut() {
            Self::sort_for_display(templates);
        }
        grouped
    }

    /// Collapse per-weekday templates sharing branch and timeframe.
    ///
    /// The first template seen for a pair supplies its metadata; the weekday
    /// set is the union over all of them.
    pub fn dedupe_by_branch_timeframe(&self) -> Vec<GroupedSlot> {
        let mut groups: Vec<GroupedSlot> = Vec::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        for template in &self.templates {
            let key = (template.branch_id.clone(), template.timeframe_id.clone());
            match index.get(&key) {
                Some(&position) => {
                    groups[position].absorb(template.clone());
                }
                None => {
                    index.insert(key, groups.len());
                    groups.push(GroupedSlot::new(template.clone()));
                }
            }
        }

        groups.sort_by_key(|g| {
            let minutes = g.representative().start_minutes();
            (minutes.is_none(), minutes)
        });
        groups
    }

    /// Templates recurring on the weekday of `date`, as occurrences on it
    pub fn occurrences_for_date(&self, date: NaiveDate) -> Vec<SlotOccurrence> {
        let weekday = WeekdayKey::from_date(date);
        let mut templates: Vec<SlotTemplate> = self
            .templates
            .iter()
            .filter(|t| t.weekday == weekday)
            .cloned()
            .collect();
        Self::sort_for_display(&mut templates);

        templates
            .into_iter()
            .filter_map(|t| SlotOccurrence::new(t, date).ok())
            .collect()
    }

    /// Occurrences for every day of the week at `offset`, Monday first
    pub fn occurrences_for_week(
        &self,
        calendar: &WeekdayCalendar,
        offset: i32,
    ) -> BTreeMap<NaiveDate, Vec<SlotOccurrence>> {
        calendar
            .week_of_offset(offset)
            .days()
            .map(|date| (date, self.occurrences_for_date(date)))
            .collect()
    }
}
