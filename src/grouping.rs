use serde::Serialize;

use crate::model::{Category, ClassifiedPage, PageRef, display_name, forms};

const INCOME_PRIORITY: &[(&str, u32)] = &[
    (forms::W2, 1),
    ("1099-NEC", 2),
    ("1099-PATR", 3),
    ("1099-MISC", 4),
    ("1099-OID", 5),
    (forms::GOVERNMENT_1099, 6),
    ("W-2G", 7),
    ("1065", 8),
    ("1120-S", 9),
    ("1041", 10),
    (forms::INT_1099, 11),
    (forms::DIV_1099, 12),
    (forms::RETIREMENT_1099, 13),
    ("1099-Q", 14),
    (forms::K1, 15),
    (forms::OTHER_1099, 16),
];

const EXPENSES_PRIORITY: &[(&str, u32)] = &[
    (forms::HSA_5498, 1),
    (forms::MARKETPLACE_1095, 2),
    (forms::COVERAGE_1095, 3),
    (forms::EMPLOYER_COVERAGE_1095, 4),
    (forms::MORTGAGE_1098, 5),
    (forms::TUITION_1098, 6),
    (forms::PROPERTY_TAX, 7),
    ("1098-Other", 8),
];

const UNRANKED: u32 = 9999;

pub const BUCKET_ORDER: [Category; 3] = [Category::Income, Category::Expenses, Category::Others];

fn priority_table(category: Category) -> &'static [(&'static str, u32)] {
    match category {
        Category::Income => INCOME_PRIORITY,
        Category::Expenses => EXPENSES_PRIORITY,
        Category::Others | Category::Unknown => &[],
    }
}

pub fn form_priority(form_type: &str, category: Category) -> u32 {
    let table = priority_table(category);
    if let Some((_, rank)) = table.iter().find(|(name, _)| *name == form_type) {
        return *rank;
    }
    table
        .iter()
        .map(|(_, rank)| rank + 1)
        .max()
        .unwrap_or(UNRANKED)
}

pub fn strip_na(label: &str) -> String {
    label.replace(", N.A", "")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedLeaf {
    #[serde(skip)]
    pub page: PageRef,
    pub file_name: String,
    pub page_number: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormGroup {
    pub form_type: String,
    pub leaves: Vec<PlannedLeaf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub category: Category,
    pub groups: Vec<FormGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutlinePlan {
    pub sections: Vec<Section>,
}

impl OutlinePlan {
    pub fn leaves(&self) -> impl Iterator<Item = &PlannedLeaf> {
        self.sections
            .iter()
            .flat_map(|section| section.groups.iter())
            .flat_map(|group| group.leaves.iter())
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    pub fn label_for(&self, page: &PageRef) -> Option<&str> {
        self.leaves()
            .find(|leaf| &leaf.page == page)
            .map(|leaf| leaf.label.as_str())
    }
}

pub fn build_plan(pages: &[ClassifiedPage]) -> OutlinePlan {
    let sections = BUCKET_ORDER
        .iter()
        .filter_map(|bucket| {
            let mut entries = pages
                .iter()
                .filter(|page| page.classification.category.bucket() == *bucket)
                .collect::<Vec<&ClassifiedPage>>();
            if entries.is_empty() {
                return None;
            }

            let groups = if *bucket == Category::Others {
                others_groups(&entries)
            } else {
                entries.sort_by(|left, right| {
                    let left_key = (
                        form_priority(&left.classification.form_type, *bucket),
                        &left.page,
                    );
                    let right_key = (
                        form_priority(&right.classification.form_type, *bucket),
                        &right.page,
                    );
                    left_key.cmp(&right_key)
                });
                form_groups(&entries)
            };

            Some(Section {
                category: *bucket,
                groups,
            })
        })
        .collect();

    OutlinePlan { sections }
}

fn form_groups(entries: &[&ClassifiedPage]) -> Vec<FormGroup> {
    let mut grouped: Vec<(&str, Vec<&ClassifiedPage>)> = Vec::new();
    for entry in entries {
        let form_type = entry.classification.form_type.as_str();
        match grouped.iter_mut().find(|(name, _)| *name == form_type) {
            Some((_, members)) => members.push(*entry),
            None => grouped.push((form_type, vec![*entry])),
        }
    }

    grouped
        .into_iter()
        .map(|(form_type, members)| FormGroup {
            form_type: form_type.to_string(),
            leaves: label_members(form_type, &members, true),
        })
        .collect()
}

fn others_groups(entries: &[&ClassifiedPage]) -> Vec<FormGroup> {
    let (duplicates, unused): (Vec<&ClassifiedPage>, Vec<&ClassifiedPage>) = entries
        .iter()
        .copied()
        .partition(|page| page.classification.form_type == forms::DUPLICATE);

    [(forms::UNUSED, unused), (forms::DUPLICATE, duplicates)]
        .into_iter()
        .filter(|(_, members)| !members.is_empty())
        .map(|(form_type, members)| FormGroup {
            form_type: form_type.to_string(),
            leaves: label_members(form_type, &members, false),
        })
        .collect()
}

fn label_members(form_type: &str, members: &[&ClassifiedPage], use_entity: bool) -> Vec<PlannedLeaf> {
    let single = members.len() == 1;
    members
        .iter()
        .enumerate()
        .map(|(index, member)| {
            let positional = if single {
                form_type.to_string()
            } else {
                format!("{form_type}#{}", index + 1)
            };
            let label = member
                .entity_label
                .as_deref()
                .filter(|label| use_entity && !label.trim().is_empty())
                .map(str::to_string)
                .unwrap_or(positional);

            PlannedLeaf {
                page: member.page.clone(),
                file_name: display_name(&member.page.document),
                page_number: member.page.page_index + 1,
                label: strip_na(&label),
            }
        })
        .collect()
}
