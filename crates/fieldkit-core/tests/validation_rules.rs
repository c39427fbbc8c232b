//! # Completeness Rule Tests (R0-R5)
//!
//! End-to-end checks of the save rules through the public `Workspace` API.
//!
//! ## Tiers
//! - R0: Frequency
//! - R1: Amplifier fields and adjustment
//! - R2: Photo requirements
//! - R3: Node adjustment by technology
//! - R4: Uniqueness within a report
//! - R5: Autosave lifecycle and purge

#![allow(clippy::panic)]

use fieldkit_core::{
    AmplifierAdjustment, AmplifierMode, AssetDraft, AssetKind, FieldError, Frequency, PhotoCategory,
    PlanTable, Port, PortIndex, ReportId, Technology, ValidationMessage, Workspace,
};

// =============================================================================
// HELPERS
// =============================================================================

fn workspace_with_report() -> (Workspace, ReportId) {
    let mut ws = Workspace::new();
    let report = ws.create_report("Sector Norte", "N-204").expect("report");
    (ws, report.id)
}

fn workspace_with_plan(technology: &str) -> (Workspace, ReportId) {
    let csv = format!("node,technology\nN-204,{}\n", technology);
    let plan = PlanTable::from_reader(csv.as_bytes()).expect("plan");
    let mut ws = Workspace::new().with_plan(plan);
    let report = ws.create_report("Sector Norte", "N-204").expect("report");
    (ws, report.id)
}

fn full_adjustment() -> AmplifierAdjustment {
    AmplifierAdjustment {
        input_low_dbmv: Some(11.0),
        input_high_dbmv: Some(15.0),
        input_high_freq_mhz: Some(750),
        plan_low_dbmv: Some(9.0),
        plan_high_dbmv: Some(17.0),
        output_ch50_dbmv: Some(36.0),
        output_ch70_dbmv: Some(37.0),
        output_ch110_dbmv: Some(39.0),
        output_ch116_dbmv: Some(40.0),
        output_ch136_dbmv: Some(41.5),
    }
}

fn amplifier(report: ReportId, port: Port, index: u8) -> AssetDraft {
    let mut draft = AssetDraft::new(report, AssetKind::Amplifier);
    draft.frequency = Some(Frequency::Mhz85);
    draft.amplifier_mode = Some(AmplifierMode::Hgdt);
    draft.port = Some(port);
    draft.port_index = PortIndex::new(index).ok();
    draft.amplifier_adjustment = full_adjustment();
    draft
}

fn vccap_node(report: ReportId) -> AssetDraft {
    let mut draft = AssetDraft::new(report, AssetKind::Node);
    draft.frequency = Some(Frequency::Mhz42);
    draft.technology = Some(Technology::Vccap);
    draft.node_adjustment.sfp_distance_km = Some(4.2);
    draft.node_adjustment.direct_power_confirmed = true;
    draft.node_adjustment.return_power_confirmed = true;
    draft.node_adjustment.spectrum_confirmed = true;
    draft.node_adjustment.docsis_confirmed = true;
    draft
}

fn legacy_node(report: ReportId) -> AssetDraft {
    let mut draft = AssetDraft::new(report, AssetKind::Node);
    draft.frequency = Some(Frequency::Mhz42);
    draft.technology = Some(Technology::Legacy);
    draft.node_adjustment.tx_1310_confirmed = true;
    draft.node_adjustment.power_confirmed = true;
    draft.node_adjustment.rx_pad = Some("-6 dB".to_string());
    draft.node_adjustment.measurement_confirmed = true;
    draft.node_adjustment.spectrum_confirmed = true;
    draft
}

fn stage(ws: &Workspace, draft: &mut AssetDraft, category: PhotoCategory, n: usize) {
    for _ in 0..n {
        ws.stage_photo(1, draft, category, b"jpeg", None)
            .expect("stage");
    }
}

// =============================================================================
// TIER R0: FREQUENCY
// =============================================================================

mod r0_frequency {
    use super::*;

    /// R0.1: A draft without frequency is never ready, whatever else is set.
    #[test]
    fn missing_frequency_blocks_both_kinds() {
        let (ws, report) = workspace_with_report();

        let mut amp = amplifier(report, Port::Main, 1);
        stage(&ws, &mut amp, PhotoCategory::Module, 2);
        amp.frequency = None;
        let eval = ws.evaluate_draft(&amp).expect("eval");
        assert!(!eval.ready);
        assert!(!eval.checks.frequency_set);

        let mut node = vccap_node(report);
        stage(&ws, &mut node, PhotoCategory::Module, 2);
        node.frequency = None;
        assert!(!ws.evaluate_draft(&node).expect("eval").ready);
    }
}

// =============================================================================
// TIER R1: AMPLIFIER FIELDS AND ADJUSTMENT
// =============================================================================

mod r1_amplifier {
    use super::*;

    /// R1.1: A complete amplifier with two module photos is ready.
    #[test]
    fn complete_amplifier_is_ready() {
        let (ws, report) = workspace_with_report();
        let mut draft = amplifier(report, Port::Aux, 3);
        stage(&ws, &mut draft, PhotoCategory::Module, 2);
        let eval = ws.evaluate_draft(&draft).expect("eval");
        assert!(eval.ready, "{:?}", eval.checks);
        assert_eq!(eval.message, None);
    }

    /// R1.2: Mode, port and index are each required.
    #[test]
    fn position_and_mode_required() {
        let (ws, report) = workspace_with_report();
        let mut base = amplifier(report, Port::Aux, 3);
        stage(&ws, &mut base, PhotoCategory::Module, 2);

        let mut no_port = base.clone();
        no_port.port = None;
        let mut no_index = base.clone();
        no_index.port_index = None;

        for draft in [no_port, no_index] {
            let eval = ws.evaluate_draft(&draft).expect("eval");
            assert!(!eval.ready);
            assert_eq!(eval.message, Some(ValidationMessage::MissingFieldsOrPhotos));
        }

        // Without mode the adjustment is not required, but the draft is still incomplete.
        let mut no_mode = base;
        no_mode.amplifier_mode = None;
        let eval = ws.evaluate_draft(&no_mode).expect("eval");
        assert!(!eval.ready);
        assert!(eval.checks.amplifier_adjustment_ok);
    }

    /// R1.3: Every adjustment reading is required once mode and frequency are set.
    #[test]
    fn missing_reading_reports_amplifier_adjustment() {
        let (ws, report) = workspace_with_report();
        let mut draft = amplifier(report, Port::Main, 1);
        stage(&ws, &mut draft, PhotoCategory::Module, 2);
        draft.amplifier_adjustment.output_ch116_dbmv = None;

        let eval = ws.evaluate_draft(&draft).expect("eval");
        assert!(!eval.ready);
        assert_eq!(
            eval.message,
            Some(ValidationMessage::AmplifierAdjustmentIncomplete)
        );
    }

    /// R1.4: The plan band edge must be 750 or 870 MHz.
    #[test]
    fn plan_band_edge_must_be_known() {
        let (ws, report) = workspace_with_report();
        let mut draft = amplifier(report, Port::Main, 1);
        stage(&ws, &mut draft, PhotoCategory::Module, 2);

        for (mhz, ready) in [(750, true), (870, true), (860, false), (1002, false)] {
            draft.amplifier_adjustment.input_high_freq_mhz = Some(mhz);
            assert_eq!(ws.evaluate_draft(&draft).expect("eval").ready, ready, "{} MHz", mhz);
        }
    }
}

// =============================================================================
// TIER R2: PHOTO REQUIREMENTS
// =============================================================================

mod r2_photos {
    use super::*;

    /// R2.1: RPHY nodes need no module photos; every other asset needs two.
    #[test]
    fn module_minimum_depends_on_rphy() {
        let (ws, report) = workspace_with_report();

        let mut rphy = vccap_node(report);
        rphy.technology = Some(Technology::Rphy);
        assert!(ws.evaluate_draft(&rphy).expect("eval").ready);

        let mut vccap = vccap_node(report);
        assert!(!ws.evaluate_draft(&vccap).expect("eval").checks.photos_ok);
        stage(&ws, &mut vccap, PhotoCategory::Module, 2);
        assert!(ws.evaluate_draft(&vccap).expect("eval").ready);

        let mut amp = amplifier(report, Port::Main, 1);
        stage(&ws, &mut amp, PhotoCategory::Module, 1);
        assert!(!ws.evaluate_draft(&amp).expect("eval").checks.photos_ok);
    }

    /// R2.2: Legacy nodes need one or two optics photos; a third is rejected.
    #[test]
    fn legacy_optics_window() {
        let (ws, report) = workspace_with_report();
        let mut draft = legacy_node(report);
        stage(&ws, &mut draft, PhotoCategory::Module, 2);
        assert!(!ws.evaluate_draft(&draft).expect("eval").ready);

        stage(&ws, &mut draft, PhotoCategory::Optics, 1);
        assert!(ws.evaluate_draft(&draft).expect("eval").ready);
        stage(&ws, &mut draft, PhotoCategory::Optics, 1);
        assert!(ws.evaluate_draft(&draft).expect("eval").ready);

        let third = ws.stage_photo(1, &mut draft, PhotoCategory::Optics, b"jpeg", None);
        assert!(matches!(
            third,
            Err(FieldError::PhotoLimitReached {
                category: PhotoCategory::Optics,
                max: 2
            })
        ));
        assert_eq!(draft.staged_count(PhotoCategory::Optics), 2);
    }

    /// R2.3: Monitoring and spectrum photos never block a save.
    #[test]
    fn informational_categories_do_not_block() {
        let (ws, report) = workspace_with_report();
        let mut draft = amplifier(report, Port::Main, 1);
        stage(&ws, &mut draft, PhotoCategory::Module, 2);
        let before = ws.evaluate_draft(&draft).expect("eval");
        stage(&ws, &mut draft, PhotoCategory::Monitoring, 2);
        stage(&ws, &mut draft, PhotoCategory::Spectrum, 3);
        assert_eq!(ws.evaluate_draft(&draft).expect("eval"), before);
    }

    /// R2.4: Spectrum allows four photos only on Legacy and VCCAP nodes.
    #[test]
    fn spectrum_cap_by_technology() {
        let (ws, report) = workspace_with_report();

        let mut legacy = legacy_node(report);
        stage(&ws, &mut legacy, PhotoCategory::Spectrum, 4);

        let mut amp = amplifier(report, Port::Main, 1);
        stage(&ws, &mut amp, PhotoCategory::Spectrum, 3);
        assert!(matches!(
            ws.stage_photo(1, &mut amp, PhotoCategory::Spectrum, b"jpeg", None),
            Err(FieldError::PhotoLimitReached { max: 3, .. })
        ));
    }
}

// =============================================================================
// TIER R3: NODE ADJUSTMENT BY TECHNOLOGY
// =============================================================================

mod r3_node_adjustment {
    use super::*;

    /// R3.1: The VCCAP example with every confirmation is complete.
    #[test]
    fn vccap_with_all_confirmations() {
        let (ws, report) = workspace_with_plan("VCCAP");
        let mut draft = vccap_node(report);
        stage(&ws, &mut draft, PhotoCategory::Module, 2);
        let eval = ws.evaluate_draft(&draft).expect("eval");
        assert!(eval.checks.node_adjustment_ok);
        assert!(eval.ready);
    }

    /// R3.2: Missing DOCSIS names the node adjustment when the plan lists the node.
    #[test]
    fn vccap_without_docsis_with_plan_row() {
        let (ws, report) = workspace_with_plan("vCCAP");
        let mut draft = vccap_node(report);
        stage(&ws, &mut draft, PhotoCategory::Module, 2);
        draft.node_adjustment.docsis_confirmed = false;

        let eval = ws.evaluate_draft(&draft).expect("eval");
        assert!(!eval.ready);
        assert_eq!(eval.message, Some(ValidationMessage::NodeAdjustmentIncomplete));
        assert_eq!(
            eval.message.map(ValidationMessage::text),
            Some("Completa el Ajuste de Nodo")
        );
    }

    /// R3.3: Without a plan row the same draft gets the generic message.
    #[test]
    fn vccap_without_docsis_without_plan_row() {
        let (ws, report) = workspace_with_report();
        let mut draft = vccap_node(report);
        stage(&ws, &mut draft, PhotoCategory::Module, 2);
        draft.node_adjustment.docsis_confirmed = false;

        let eval = ws.evaluate_draft(&draft).expect("eval");
        assert!(!eval.ready);
        assert_eq!(eval.message, Some(ValidationMessage::MissingFieldsOrPhotos));
    }

    /// R3.4: The plan supplies the technology when the draft has none.
    #[test]
    fn plan_technology_applies_to_unset_draft() {
        let (ws, report) = workspace_with_plan("RPHY");
        let mut draft = vccap_node(report);
        draft.technology = None;
        let eval = ws.evaluate_draft(&draft).expect("eval");
        assert_eq!(eval.technology, Some(Technology::Rphy));
        assert!(eval.ready);
    }

    /// R3.5: An unparseable plan value still counts as a plan row.
    #[test]
    fn unknown_plan_technology_keeps_row() {
        let (ws, report) = workspace_with_plan("GPON");
        let mut draft = vccap_node(report);
        draft.technology = None;
        let eval = ws.evaluate_draft(&draft).expect("eval");
        assert_eq!(eval.technology, None);
        assert!(!eval.ready);
        assert_eq!(eval.message, Some(ValidationMessage::NodeAdjustmentIncomplete));
    }
}

// =============================================================================
// TIER R4: UNIQUENESS WITHIN A REPORT
// =============================================================================

mod r4_uniqueness {
    use super::*;

    /// R4.1: Explicit save of a second amplifier at the same position fails.
    #[test]
    fn duplicate_port_blocks_explicit_save() {
        let (mut ws, report) = workspace_with_report();
        let mut first = amplifier(report, Port::Bridger, 2);
        stage(&ws, &mut first, PhotoCategory::Module, 2);
        let saved = ws.save_asset(&mut first).expect("first save");

        let mut second = amplifier(report, Port::Bridger, 2);
        stage(&ws, &mut second, PhotoCategory::Module, 2);
        let result = ws.save_asset(&mut second);
        match result {
            Err(FieldError::DuplicatePort { existing, .. }) => {
                assert_eq!(existing, saved.asset.id);
            }
            other => panic!("expected duplicate port, got {:?}", other),
        }

        // A different index is fine.
        second.port_index = PortIndex::new(3).ok();
        assert!(ws.save_asset(&mut second).is_ok());
    }

    /// R4.2: Re-saving the same amplifier does not conflict with itself.
    #[test]
    fn resave_keeps_position() {
        let (mut ws, report) = workspace_with_report();
        let mut draft = amplifier(report, Port::Express, 4);
        stage(&ws, &mut draft, PhotoCategory::Module, 2);
        ws.save_asset(&mut draft).expect("save");
        assert!(ws.save_asset(&mut draft).is_ok());
    }

    /// R4.3: A second node is refused; editing the first is not.
    #[test]
    fn one_node_per_report() {
        let (mut ws, report) = workspace_with_report();
        let mut first = vccap_node(report);
        first.technology = Some(Technology::Rphy);
        let saved = ws.save_asset(&mut first).expect("save");

        let mut second = vccap_node(report);
        second.technology = Some(Technology::Rphy);
        let eval = ws.evaluate_draft(&second).expect("eval");
        assert!(!eval.checks.node_allowed);
        assert_eq!(eval.message, Some(ValidationMessage::NodeAlreadyPresent));
        assert!(matches!(
            ws.save_asset(&mut second),
            Err(FieldError::NodeAlreadyPresent(_))
        ));

        let mut edit = ws.load_draft(saved.asset.id).expect("load");
        assert!(ws.evaluate_draft(&edit).expect("eval").checks.node_allowed);
        assert!(ws.save_asset(&mut edit).is_ok());
    }
}

// =============================================================================
// TIER R5: AUTOSAVE LIFECYCLE AND PURGE
// =============================================================================

mod r5_lifecycle {
    use super::*;
    use fieldkit_core::{AutosaveOutcome, AutosaveTrigger, FileStore, PassiveKind};
    use tempfile::tempdir;

    /// R5.1: First ready recompute creates, the next updates, the folder exists.
    #[test]
    fn autosave_creates_then_updates() {
        let dir = tempdir().expect("tempdir");
        let mut ws = Workspace::new().with_files(FileStore::new(dir.path()));
        let report = ws.create_report("Sector Norte", "N-204").expect("report");

        let mut trigger = AutosaveTrigger::new(9, AssetDraft::new(report.id, AssetKind::Amplifier));
        let outcome = trigger.update(&mut ws, amplifier(report.id, Port::Main, 1));
        assert!(matches!(outcome, AutosaveOutcome::NotReady { .. }));
        assert!(ws.assets(report.id).expect("assets").is_empty());

        trigger
            .add_photo(&mut ws, PhotoCategory::Module, b"one", None)
            .expect("photo");
        let created = trigger
            .add_photo(&mut ws, PhotoCategory::Module, b"two", None)
            .expect("photo");
        let AutosaveOutcome::Created { asset, .. } = created else {
            panic!("expected create, got {:?}", created);
        };

        let saved = ws.asset(asset).expect("asset");
        let folder = dir
            .path()
            .join(&ws.report(report.id).expect("report").folder_name)
            .join(saved.dir_name());
        assert!(folder.is_dir());
        assert_eq!(ws.photos(asset).expect("photos").len(), 2);

        let mut edits = trigger.draft().clone();
        edits.amplifier_mode = Some(AmplifierMode::Le);
        let updated = trigger.update(&mut ws, edits);
        assert!(matches!(updated, AutosaveOutcome::Updated { asset: a, .. } if a == asset));
        assert_eq!(
            ws.asset(asset).expect("asset").amplifier_mode,
            Some(AmplifierMode::Le)
        );
    }

    /// R5.2: Purging a report removes assets, photos, passives and its folder.
    #[test]
    fn purge_cascades() {
        let dir = tempdir().expect("tempdir");
        let mut ws = Workspace::new().with_files(FileStore::new(dir.path()));
        let report = ws.create_report("Sector Norte", "N-204").expect("report");

        let mut draft = amplifier(report.id, Port::Main, 1);
        stage(&ws, &mut draft, PhotoCategory::Module, 2);
        let saved = ws.save_asset(&mut draft).expect("save");
        ws.add_passive(report.id, "Cra 7 # 12-30", PassiveKind::Coupler, "sin tapa")
            .expect("passive");

        ws.trash_report(report.id).expect("trash");
        ws.purge_report(report.id).expect("purge");

        assert!(ws.asset(saved.asset.id).is_err());
        assert!(ws.photos(saved.asset.id).expect("photos").is_empty());
        assert!(ws.passives(report.id).expect("passives").is_empty());
        assert!(!dir.path().join(&report.folder_name).exists());
    }
}
