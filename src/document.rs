use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::model::{
    EducationItem, ItemId, Origin, Payload, PersonalInfo, ProjectItem, Section, SectionId,
    SectionKind, SkillItem, Styles, WorkItem,
};

/// The in-memory résumé. All edits go through the methods below; the renderer and
/// pager only ever borrow it.
#[derive(Clone, Debug, Default)]
pub struct Document {
    sections: Vec<Section>,
    /// Every section and item id ever issued or seen. Never shrinks.
    issued: HashSet<String>,
    /// Item ids handed to callers by `new_item_id` and not yet placed in a payload.
    unplaced: HashSet<String>,
    next_serial: u64,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.sections == other.sections
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from externally supplied sections, rejecting anything that
    /// breaks the id and singleton rules instead of repairing it.
    pub fn from_sections(sections: Vec<Section>) -> Result<Self> {
        let mut seen_sections = HashSet::new();
        let mut personal_count = 0usize;
        for section in &sections {
            if !seen_sections.insert(section.id.0.as_str()) {
                return Err(Error::InvariantViolation(format!(
                    "duplicate section id {}",
                    section.id
                )));
            }
            if section.kind() == SectionKind::Personal {
                personal_count += 1;
            }
            let mut seen_items = HashSet::new();
            for id in section.payload.item_ids() {
                if !seen_items.insert(id.0.as_str()) {
                    return Err(Error::InvariantViolation(format!(
                        "duplicate item id {} in section {}",
                        id, section.id
                    )));
                }
            }
        }
        if personal_count > 1 {
            return Err(Error::InvariantViolation(format!(
                "{personal_count} personal sections, at most one allowed"
            )));
        }

        let mut doc = Document {
            sections,
            issued: HashSet::new(),
            unplaced: HashSet::new(),
            next_serial: 0,
        };
        let known: Vec<String> = doc
            .sections
            .iter()
            .flat_map(|s| {
                std::iter::once(s.id.0.clone()).chain(s.payload.item_ids().into_iter().map(|i| i.0.clone()))
            })
            .collect();
        doc.issued.extend(known);
        Ok(doc)
    }

    /// The starter template a new document opens with.
    pub fn starter() -> Self {
        let mut doc = Document::new();
        let personal = PersonalInfo {
            name: "Jane Doe".into(),
            title: "Frontend Engineer".into(),
            email: "jane.doe@example.com".into(),
            phone: "+1 555 0100".into(),
            address: "Springfield".into(),
            summary: "Five years of frontend experience with React and Vue, building responsive \
                      sites and single-page applications."
                .into(),
            photo: String::new(),
        };
        let education = vec![EducationItem {
            id: doc.fresh_item_id(),
            school: "State University".into(),
            degree: "B.Sc.".into(),
            field: "Computer Science".into(),
            start_date: "2015-09".into(),
            end_date: "2019-06".into(),
            description: "Coursework: data structures, algorithms, networks, operating systems".into(),
            ..Default::default()
        }];
        let work = vec![WorkItem {
            id: doc.fresh_item_id(),
            company: "ABC Technology".into(),
            position: "Frontend Engineer".into(),
            start_date: "2019-07".into(),
            end_date: "present".into(),
            description: "Built the product frontend as a React single-page application and \
                          improved page performance."
                .into(),
            ..Default::default()
        }];
        let skills = [("HTML/CSS", 5.0), ("JavaScript", 4.0), ("React", 4.0), ("Vue", 3.0)]
            .into_iter()
            .map(|(name, level)| SkillItem {
                id: doc.fresh_item_id(),
                name: name.into(),
                level,
                styles: None,
            })
            .collect();
        let projects = vec![ProjectItem {
            id: doc.fresh_item_id(),
            name: "Back-office Suite".into(),
            description: "Admin system with user management, permissions and reporting.".into(),
            technologies: vec!["React".into(), "Ant Design".into(), "Node.js".into(), "MongoDB".into()],
            link: "https://github.com/username/project".into(),
            styles: None,
        }];

        for payload in [
            Payload::Personal(personal),
            Payload::Education(education),
            Payload::Work(work),
            Payload::Skills(skills),
            Payload::Projects(projects),
        ] {
            let kind = payload.kind();
            let id = doc.new_section_id();
            let order = doc.next_order();
            doc.sections.push(Section {
                id,
                title: kind.default_title().to_string(),
                visible: true,
                order,
                origin: Origin::Builtin,
                payload,
                styles: None,
            });
        }
        doc
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }

    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.id == id)
    }

    fn section_mut(&mut self, id: &SectionId) -> Result<&mut Section> {
        self.sections
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| Error::UnknownSection(id.to_string()))
    }

    /// Canonical render order: ascending `order`, ties broken by id.
    pub fn render_order(&self) -> Vec<&Section> {
        let mut ordered: Vec<&Section> = self.sections.iter().collect();
        ordered.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        ordered
    }

    pub fn visible_sections(&self) -> Vec<&Section> {
        self.render_order().into_iter().filter(|s| s.visible).collect()
    }

    fn has_personal(&self) -> bool {
        self.sections.iter().any(|s| s.kind() == SectionKind::Personal)
    }

    fn next_order(&self) -> i64 {
        self.sections.iter().map(|s| s.order).max().unwrap_or(0) + 1
    }

    fn issue(&mut self, prefix: &str) -> String {
        loop {
            self.next_serial += 1;
            let candidate = format!("{prefix}-{}", self.next_serial);
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    fn new_section_id(&mut self) -> SectionId {
        SectionId(self.issue("section"))
    }

    fn fresh_item_id(&mut self) -> ItemId {
        ItemId(self.issue("item"))
    }

    /// Fresh item id for editors adding a row to a list-shaped section. It stays
    /// usable in `update_payload` until it has been placed once.
    pub fn new_item_id(&mut self) -> ItemId {
        let id = self.fresh_item_id();
        self.unplaced.insert(id.0.clone());
        id
    }

    pub fn add_section(&mut self, kind: SectionKind, title: &str) -> Result<SectionId> {
        if kind == SectionKind::Personal && self.has_personal() {
            return Err(Error::InvariantViolation(
                "document already has a personal section".into(),
            ));
        }
        let title = match title.trim() {
            "" => kind.default_title().to_string(),
            t => t.to_string(),
        };
        let origin = match kind {
            SectionKind::Custom => Origin::UserCreated,
            _ => Origin::Builtin,
        };
        let id = self.new_section_id();
        let order = self.next_order();
        log::debug!("add_section: {id} kind={kind:?} order={order}");
        self.sections.push(Section {
            id: id.clone(),
            title,
            visible: true,
            order,
            origin,
            payload: kind.empty_payload(),
            styles: None,
        });
        Ok(id)
    }

    pub fn duplicate_section(&mut self, id: &SectionId) -> Result<SectionId> {
        let source = self
            .section(id)
            .cloned()
            .ok_or_else(|| Error::UnknownSection(id.to_string()))?;
        if source.kind() == SectionKind::Personal {
            return Err(Error::InvariantViolation(
                "the personal section cannot be duplicated".into(),
            ));
        }
        let mut copy = source;
        copy.id = self.new_section_id();
        copy.title = format!("{} (copy)", copy.title);
        copy.order = self.next_order();
        copy.origin = Origin::Duplicated;
        copy.payload.reassign_item_ids(|| self.fresh_item_id());
        let new_id = copy.id.clone();
        self.sections.push(copy);
        Ok(new_id)
    }

    pub fn delete_section(&mut self, id: &SectionId) -> Result<()> {
        let section = self
            .section(id)
            .ok_or_else(|| Error::UnknownSection(id.to_string()))?;
        if !section.origin.is_deletable() {
            return Err(Error::NotDeletable(id.to_string()));
        }
        self.sections.retain(|s| &s.id != id);
        Ok(())
    }

    /// Blank titles are ignored, matching the editor's behavior on an empty input.
    pub fn rename_section(&mut self, id: &SectionId, title: &str) -> Result<()> {
        let section = self.section_mut(id)?;
        let trimmed = title.trim();
        if !trimmed.is_empty() {
            section.title = trimmed.to_string();
        }
        Ok(())
    }

    pub fn set_visible(&mut self, id: &SectionId, visible: bool) -> Result<()> {
        self.section_mut(id)?.visible = visible;
        Ok(())
    }

    /// Drag-to-reorder: place `dragged` where `target` currently sits in render
    /// order, then renumber every section 1..=n.
    pub fn move_section(&mut self, dragged: &SectionId, target: &SectionId) -> Result<()> {
        let mut ids: Vec<SectionId> = self.render_order().iter().map(|s| s.id.clone()).collect();
        let from = ids
            .iter()
            .position(|i| i == dragged)
            .ok_or_else(|| Error::UnknownSection(dragged.to_string()))?;
        let to = ids
            .iter()
            .position(|i| i == target)
            .ok_or_else(|| Error::UnknownSection(target.to_string()))?;
        if from == to {
            return Ok(());
        }
        let moved = ids.remove(from);
        ids.insert(to, moved);
        for (rank, id) in ids.iter().enumerate() {
            self.section_mut(id)?.order = rank as i64 + 1;
        }
        Ok(())
    }

    /// Replace a section's payload. The kind must not change, item ids must stay
    /// unique within the section, and an id issued elsewhere or deleted earlier is
    /// never accepted again.
    pub fn update_payload(&mut self, id: &SectionId, payload: Payload) -> Result<()> {
        let mut seen = HashSet::new();
        for item in payload.item_ids() {
            if !seen.insert(item.0.as_str()) {
                return Err(Error::InvariantViolation(format!(
                    "duplicate item id {item} in section {id}"
                )));
            }
        }
        let section = self
            .section(id)
            .ok_or_else(|| Error::UnknownSection(id.to_string()))?;
        if section.kind() != payload.kind() {
            return Err(Error::InvariantViolation(format!(
                "section {id} is {:?}, payload is {:?}",
                section.kind(),
                payload.kind()
            )));
        }
        // ids are never reused: an issued id must already belong to this section
        // or be a fresh one from `new_item_id`
        let current: HashSet<&str> = section.payload.item_ids().into_iter().map(|i| i.0.as_str()).collect();
        if let Some(reused) = payload.item_ids().into_iter().find(|i| {
            let i = i.0.as_str();
            self.issued.contains(i) && !current.contains(i) && !self.unplaced.contains(i)
        }) {
            return Err(Error::InvariantViolation(format!(
                "item id {reused} was already issued and is not in section {id}"
            )));
        }

        let new_ids: Vec<String> = payload.item_ids().iter().map(|i| i.0.clone()).collect();
        for new_id in &new_ids {
            self.unplaced.remove(new_id);
        }
        self.issued.extend(new_ids);
        self.section_mut(id)?.payload = payload;
        Ok(())
    }

    pub fn update_styles(&mut self, id: &SectionId, styles: Option<Styles>) -> Result<()> {
        self.section_mut(id)?.styles = styles;
        Ok(())
    }

    pub fn update_item_styles(
        &mut self,
        id: &SectionId,
        item: &ItemId,
        styles: Option<Styles>,
    ) -> Result<()> {
        let section = self.section_mut(id)?;
        let slot = section
            .payload
            .item_styles_mut(item)
            .ok_or_else(|| Error::UnknownItem(id.to_string(), item.to_string()))?;
        *slot = styles;
        Ok(())
    }

    pub fn set_date_right_align(&mut self, id: &SectionId, item: &ItemId, right: bool) -> Result<()> {
        let section = self.section_mut(id)?;
        let flag = match &mut section.payload {
            Payload::Education(items) => items.iter_mut().find(|i| &i.id == item).map(|i| &mut i.date_right_align),
            Payload::Work(items) => items.iter_mut().find(|i| &i.id == item).map(|i| &mut i.date_right_align),
            _ => {
                return Err(Error::InvariantViolation(format!(
                    "section {id} has no date layout"
                )));
            }
        };
        let flag = flag.ok_or_else(|| Error::UnknownItem(id.to_string(), item.to_string()))?;
        *flag = Some(right);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CustomItem, TextStyle};

    #[test]
    fn starter_has_builtin_sections_in_order() {
        let doc = Document::starter();
        let kinds: Vec<SectionKind> = doc.render_order().iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Personal,
                SectionKind::Education,
                SectionKind::Work,
                SectionKind::Skills,
                SectionKind::Projects
            ]
        );
        assert!(doc.sections().iter().all(|s| s.origin == Origin::Builtin));
    }

    #[test]
    fn render_order_breaks_ties_by_id() {
        let mut doc = Document::new();
        let a = doc.add_section(SectionKind::Custom, "A").unwrap();
        let b = doc.add_section(SectionKind::Custom, "B").unwrap();
        doc.section_mut(&a).unwrap().order = 7;
        doc.section_mut(&b).unwrap().order = 7;
        let ids: Vec<&SectionId> = doc.render_order().iter().map(|s| &s.id).collect();
        let mut expected = vec![&a, &b];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn builtin_sections_are_not_deletable() {
        let mut doc = Document::starter();
        let first = doc.render_order()[1].id.clone();
        assert!(matches!(doc.delete_section(&first), Err(Error::NotDeletable(_))));

        let copy = doc.duplicate_section(&first).unwrap();
        assert_eq!(doc.section(&copy).unwrap().origin, Origin::Duplicated);
        doc.delete_section(&copy).unwrap();
        assert!(doc.section(&copy).is_none());
    }

    #[test]
    fn ids_are_never_reused_after_deletion() {
        let mut doc = Document::new();
        let a = doc.add_section(SectionKind::Custom, "").unwrap();
        doc.delete_section(&a).unwrap();
        let b = doc.add_section(SectionKind::Custom, "").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn duplicate_gets_fresh_item_ids_and_trails() {
        let mut doc = Document::starter();
        let work = doc
            .sections()
            .iter()
            .find(|s| s.kind() == SectionKind::Work)
            .unwrap()
            .id
            .clone();
        let copy = doc.duplicate_section(&work).unwrap();
        let original_ids = doc.section(&work).unwrap().payload.item_ids().len();
        let copy_section = doc.section(&copy).unwrap();
        assert_eq!(copy_section.payload.item_ids().len(), original_ids);
        assert_ne!(
            copy_section.payload.item_ids(),
            doc.section(&work).unwrap().payload.item_ids()
        );
        assert_eq!(copy_section.title, "Work Experience (copy)");
        assert_eq!(copy_section.order, 6);
    }

    #[test]
    fn personal_is_a_singleton() {
        let mut doc = Document::starter();
        assert!(matches!(
            doc.add_section(SectionKind::Personal, ""),
            Err(Error::InvariantViolation(_))
        ));
        let personal = doc.render_order()[0].id.clone();
        assert!(doc.duplicate_section(&personal).is_err());
    }

    #[test]
    fn from_sections_rejects_duplicate_ids() {
        let doc = Document::starter();
        let mut sections = doc.into_sections();
        sections[2].id = sections[1].id.clone();
        assert!(matches!(
            Document::from_sections(sections),
            Err(Error::InvariantViolation(_))
        ));
    }

    #[test]
    fn move_section_renumbers_orders() {
        let mut doc = Document::starter();
        let ids: Vec<SectionId> = doc.render_order().iter().map(|s| s.id.clone()).collect();
        doc.move_section(&ids[4], &ids[1]).unwrap();
        let after: Vec<SectionId> = doc.render_order().iter().map(|s| s.id.clone()).collect();
        assert_eq!(after, vec![ids[0].clone(), ids[4].clone(), ids[1].clone(), ids[2].clone(), ids[3].clone()]);
        let orders: Vec<i64> = doc.render_order().iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn visibility_toggle_keeps_order() {
        let mut doc = Document::starter();
        let id = doc.render_order()[2].id.clone();
        let before = doc.section(&id).unwrap().order;
        doc.set_visible(&id, false).unwrap();
        assert_eq!(doc.section(&id).unwrap().order, before);
        assert_eq!(doc.visible_sections().len(), 4);
    }

    #[test]
    fn update_payload_checks_kind_and_item_ids() {
        let mut doc = Document::new();
        let id = doc.add_section(SectionKind::Custom, "Extra").unwrap();
        let item = doc.new_item_id();
        let dup = vec![
            CustomItem { id: item.clone(), ..Default::default() },
            CustomItem { id: item.clone(), ..Default::default() },
        ];
        assert!(doc.update_payload(&id, Payload::Custom(dup)).is_err());
        assert!(doc.update_payload(&id, Payload::Skills(vec![])).is_err());

        let one = vec![CustomItem {
            id: item.clone(),
            label: "Languages".into(),
            content: "English, German".into(),
            ..Default::default()
        }];
        doc.update_payload(&id, Payload::Custom(one)).unwrap();

        let mut styles = Styles::new();
        styles.insert("label".into(), TextStyle { bold: Some(true), color: None });
        doc.update_item_styles(&id, &item, Some(styles.clone())).unwrap();
        match &doc.section(&id).unwrap().payload {
            Payload::Custom(items) => assert_eq!(items[0].styles, Some(styles)),
            other => panic!("unexpected payload {other:?}"),
        }
        assert!(matches!(
            doc.update_item_styles(&id, &ItemId::from("nope"), None),
            Err(Error::UnknownItem(..))
        ));
    }

    #[test]
    fn update_payload_rejects_reused_item_ids() {
        let mut doc = Document::new();
        let id = doc.add_section(SectionKind::Custom, "Extra").unwrap();
        let other = doc.add_section(SectionKind::Custom, "Other").unwrap();
        let row = |item: &ItemId| CustomItem { id: item.clone(), ..Default::default() };

        let a = doc.new_item_id();
        doc.update_payload(&id, Payload::Custom(vec![row(&a)])).unwrap();
        // keeping an existing row is fine
        doc.update_payload(&id, Payload::Custom(vec![row(&a)])).unwrap();
        doc.update_payload(&id, Payload::Custom(vec![])).unwrap();
        assert!(matches!(
            doc.update_payload(&id, Payload::Custom(vec![row(&a)])),
            Err(Error::InvariantViolation(_))
        ));

        let as_item = ItemId(other.0.clone());
        assert!(doc.update_payload(&id, Payload::Custom(vec![row(&as_item)])).is_err());

        // a row cannot move into another section under its old id
        let b = doc.new_item_id();
        doc.update_payload(&id, Payload::Custom(vec![row(&b)])).unwrap();
        assert!(doc.update_payload(&other, Payload::Custom(vec![row(&b)])).is_err());

        // never-seen ids are still accepted
        let fresh = ItemId::from("imported-row");
        doc.update_payload(&other, Payload::Custom(vec![row(&fresh)])).unwrap();
        assert_eq!(doc.section(&other).unwrap().payload.item_ids(), vec![&fresh]);
    }

    #[test]
    fn date_alignment_only_on_dated_kinds() {
        let mut doc = Document::starter();
        let edu = doc.render_order()[1].clone();
        let item = edu.payload.item_ids()[0].clone();
        doc.set_date_right_align(&edu.id, &item, true).unwrap();
        match &doc.section(&edu.id).unwrap().payload {
            Payload::Education(items) => assert_eq!(items[0].date_right_align, Some(true)),
            other => panic!("unexpected payload {other:?}"),
        }
        let skills = doc.render_order()[3].id.clone();
        assert!(doc.set_date_right_align(&skills, &item, true).is_err());
    }
}
