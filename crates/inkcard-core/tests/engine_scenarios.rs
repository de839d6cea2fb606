//! # Engine Scenario Tests
//!
//! End-to-end checks across the engine, grouped by stage:
//! - S0: Binding a stored card to its stored template
//! - S1: Print export
//! - S2: Contact export
//! - S3: View ledger over both store adapters

use inkcard_core::{
    BusinessCard, CardError, CardId, CardStore, Element, ElementId, ElementStyle, FieldKey,
    Geometry, MemoryStore, NamedPaperSize, Orientation, PaperCardSettings, PaperSize, RedbStore,
    Template, TemplateStore, Timestamp, ViewLedger, ViewStore, compute_print_layout,
    format_contact, resolve,
};

fn business_card_template() -> Template {
    let mut template = Template::new("classic");
    template.name = "Classic".to_string();
    template.paper.size = PaperSize::named(NamedPaperSize::BusinessCard);
    template.paper.orientation = Orientation::Landscape;
    template.elements = vec![
        Element::picture("logo", Geometry::new(5.0, 5.0, 15.0, 15.0))
            .bound_to(FieldKey::CompanyLogo),
        Element::text("name", Geometry::new(25.0, 8.0, 55.0, 7.0))
            .bound_to(FieldKey::Name)
            .with_style(ElementStyle {
                font_size: Some(14.0),
                ..ElementStyle::default()
            }),
        Element::text("title", Geometry::new(25.0, 16.0, 55.0, 5.0)).bound_to(FieldKey::JobTitle),
        Element::text("tagline", Geometry::new(25.0, 40.0, 55.0, 5.0))
            .with_content("Building things"),
    ];
    template
}

fn anan() -> BusinessCard {
    let mut card = BusinessCard::new("card1", "owner1", "Anan Srisuk").with_template("classic");
    card.company = Some("Acme".to_string());
    card.job_title = Some("CTO".to_string());
    card.company_logo = Some("https://cdn.example.com/acme.png".to_string());
    card
}

// =============================================================================
// S0: BINDING
// =============================================================================

mod s0_binding {
    use super::*;

    /// S0.1: A stored card resolves against its stored template.
    #[test]
    fn stored_card_resolves() {
        let store = MemoryStore::new();
        store.put_template(&business_card_template()).expect("template");
        store.put_card(&anan()).expect("card");

        let card = store.get_card(&CardId::new("card1")).expect("card");
        let template = store
            .get_template(card.template_id.as_ref().expect("bound"))
            .expect("template");
        let tree = resolve(&template, &card)
            .expect("resolve")
            .into_tree()
            .expect("layout");

        let contents: Vec<&str> = tree
            .elements
            .iter()
            .map(|e| e.resolved_content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec![
                "https://cdn.example.com/acme.png",
                "Anan Srisuk",
                "CTO",
                "Building things"
            ]
        );
    }

    /// S0.2: A per-card override rewrites one element only.
    #[test]
    fn override_is_local_to_card() {
        let template = business_card_template();
        let mut customized = anan();
        customized
            .field_values
            .insert(ElementId::new("tagline"), "Printing cards since 2020".into());
        let plain = anan();

        let a = resolve(&template, &customized).expect("a").into_tree().expect("layout");
        let b = resolve(&template, &plain).expect("b").into_tree().expect("layout");
        assert_eq!(a.elements[3].resolved_content, "Printing cards since 2020");
        assert_eq!(b.elements[3].resolved_content, "Building things");
        assert_eq!(a.elements[1], b.elements[1]);
    }
}

// =============================================================================
// S1: PRINT EXPORT
// =============================================================================

mod s1_print {
    use super::*;

    /// S1.1: Card-sized settings with bleed flag an element at the edge.
    #[test]
    fn bleed_violation_is_reported_not_fatal() {
        let template = business_card_template();
        let mut card = anan();
        card.paper_card_settings = Some(PaperCardSettings {
            size: PaperSize::named(NamedPaperSize::BusinessCard),
            orientation: Orientation::Landscape,
            bleed: 3.0,
            safe_area: 3.0,
            ..PaperCardSettings::default()
        });

        let tree = resolve(&template, &card).expect("resolve").into_tree().expect("layout");
        let layout = compute_print_layout(&tree, card.paper_card_settings.as_ref());

        assert_eq!(layout.elements.len(), 4);
        // logo at 5 mm sits inside the trim box but inside the 6 mm safe band.
        let logo = layout
            .violations
            .iter()
            .find(|v| v.element_id.as_str() == "logo")
            .expect("logo violation");
        assert_eq!(logo.kind, inkcard_core::ViolationKind::OutsideSafeArea);
        // name ends at 80 mm, the safe area ends at 84 mm.
        assert!(layout.violations.iter().all(|v| v.element_id.as_str() != "name"));
    }

    /// S1.2: No settings means A4 portrait and no violations for inside elements.
    #[test]
    fn default_paper() {
        let tree = resolve(&business_card_template(), &anan())
            .expect("resolve")
            .into_tree()
            .expect("layout");
        let layout = compute_print_layout(&tree, None);
        assert_eq!(layout.orientation, Orientation::Portrait);
        assert!(layout.page_width < layout.page_height);
        assert!(layout.is_print_safe());
    }
}

// =============================================================================
// S2: CONTACT EXPORT
// =============================================================================

mod s2_contact {
    use super::*;

    /// S2.1: The exported vCard carries the card's contact fields.
    #[test]
    fn vcard_contents() {
        let payload = format_contact(&anan());
        assert!(payload.text.starts_with("BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Anan Srisuk\r\n"));
        assert!(payload.text.contains("ORG:Acme\r\n"));
        assert!(payload.text.contains("TITLE:CTO\r\n"));
        assert!(!payload.text.contains("EMAIL"));
        assert!(payload.text.ends_with("\r\nEND:VCARD\r\n"));
    }
}

// =============================================================================
// S3: VIEW LEDGER
// =============================================================================

mod s3_ledger {
    use super::*;
    use tempfile::TempDir;

    const T0: u64 = 1_750_000_000_000;

    fn exercise<S: CardStore + ViewStore>(store: &S) {
        store.put_card(&anan()).expect("card");
        let ledger = ViewLedger::default();
        let card = CardId::new("card1");

        ledger
            .record(store, &card, "ip-A", Some("Mozilla/5.0"), Timestamp(T0))
            .expect("first");
        ledger
            .record(store, &card, "ip-A", Some("Mozilla/5.0"), Timestamp(T0 + 2_000))
            .expect("second");
        let stats = ledger.stats(store, &card, Timestamp(T0 + 2_000)).expect("stats");
        assert_eq!(stats.total_views, 1);

        ledger
            .record(store, &card, "ip-A", None, Timestamp(T0 + 12_000))
            .expect("third");
        ledger
            .record(store, &card, "ip-B", None, Timestamp(T0 + 12_500))
            .expect("fourth");
        let stats = ledger.stats(store, &card, Timestamp(T0 + 13_000)).expect("stats");
        assert_eq!(stats.total_views, 3);
        assert_eq!(stats.unique_views, 2);
        assert_eq!(stats.today_views, 3);

        assert!(store.delete_card(&card).expect("delete"));
        assert!(matches!(
            ledger.stats(store, &card, Timestamp(T0)),
            Err(CardError::CardNotFound(_))
        ));
        assert!(store.views_for(&card).expect("views").is_empty());
    }

    /// S3.1: Memory adapter.
    #[test]
    fn memory_store() {
        exercise(&MemoryStore::new());
    }

    /// S3.2: redb adapter.
    #[test]
    fn redb_store() {
        let dir = TempDir::new().expect("tempdir");
        let store = RedbStore::open(dir.path().join("ledger.redb")).expect("open");
        exercise(&store);
    }
}
