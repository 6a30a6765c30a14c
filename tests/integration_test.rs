// ferrous-promoter/tests/integration_test.rs
//
// End-to-end screens over on-disk reference lists and GenBank directories.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

use ferrous_promoter::core::sequence::NucleotideSequence;
use ferrous_promoter::pipelines::screen::{ExecutionMode, Orchestrator, ScheduleError};
use ferrous_promoter::screen_opt::{RecordPolicy, ScreenOpt};

const TRP_PEPTIDE: &str = "WWWWWWWWWWWW";

/// Upstream leader with a perfect sigma70 promoter, followed by a gene body.
/// Returns the sequence and the 1-based start of the gene body.
fn promoter_leader_and_gene() -> (String, usize) {
    let leader = format!(
        "{}TTGACA{}TATAAT{}",
        "GCGCGCGCGC".repeat(3),
        "A".repeat(17),
        "GCGCGCGCGC"
    );
    let body = format!("ATG{}TAA", "TGG".repeat(12));
    (format!("{leader}{body}"), leader.len() + 1)
}

fn genbank_text(name: &str, dna: &str, cds_location: &str, locus_tag: &str) -> String {
    let mut text = format!(
        "LOCUS       {name:<16} {:>11} bp    DNA     linear   BCT 01-JAN-2020\n",
        dna.len()
    );
    text.push_str("DEFINITION  Synthetic test record.\n");
    text.push_str("FEATURES             Location/Qualifiers\n");
    text.push_str(&format!("     source          1..{}\n", dna.len()));
    text.push_str(&format!("     CDS             {cds_location}\n"));
    text.push_str(&format!("                     /locus_tag=\"{locus_tag}\"\n"));
    text.push_str(&format!("                     /translation=\"{TRP_PEPTIDE}\"\n"));
    text.push_str("ORIGIN\n");
    let bases = dna.to_ascii_lowercase();
    for (line, chunk) in bases.as_bytes().chunks(60).enumerate() {
        let groups: Vec<&str> = chunk
            .chunks(10)
            .map(|g| std::str::from_utf8(g).unwrap())
            .collect();
        text.push_str(&format!("{:>9} {}\n", line * 60 + 1, groups.join(" ")));
    }
    text.push_str("//\n");
    text
}

struct Fixture {
    _dir: TempDir,
    reference: PathBuf,
    records: PathBuf,
}

/// A forward-strand record, a gzipped reverse-strand record in a nested
/// directory and one file that is not GenBank at all.
fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join("refs.list");
    fs::write(
        &reference,
        format!("trpL\n{TRP_PEPTIDE}\nlacZ\nMTMITDSLAVVLQRRDWENPGVTQ\n\n"),
    )
    .unwrap();

    let records = dir.path().join("records");
    fs::create_dir_all(records.join("nested")).unwrap();

    let (forward, start) = promoter_leader_and_gene();
    let gene_len = forward.len() - (start - 1);
    let forward_cds = format!("{}..{}", start, forward.len());
    fs::write(
        records.join("fwd.gbk"),
        genbank_text("FWD", &forward, &forward_cds, "fwd_0001"),
    )
    .unwrap();

    // Same layout on the reverse strand: the gene occupies the first
    // `gene_len` bases of the forward sequence.
    let reverse = NucleotideSequence::from(forward.as_str())
        .reverse_complement()
        .to_string();
    let reverse_cds = format!("complement(1..{gene_len})");
    let mut gz = GzEncoder::new(
        File::create(records.join("nested").join("rev.gbk.gz")).unwrap(),
        Compression::default(),
    );
    gz.write_all(genbank_text("REV", &reverse, &reverse_cds, "rev_0001").as_bytes())
        .unwrap();
    gz.finish().unwrap();

    fs::write(records.join("broken.gbk"), "this is not a GenBank file\n").unwrap();

    Fixture {
        _dir: dir,
        reference,
        records,
    }
}

fn options(policy: RecordPolicy) -> ScreenOpt {
    ScreenOpt {
        threads: 2,
        record_policy: policy,
        ..ScreenOpt::default()
    }
}

const EXPECTED_CONSENSUS: &str = "\
all -35 TTGACA spacer 17.00 -10 TATAAT (2 matches; spacers 17:2)
lacZ no matches
trpL -35 TTGACA spacer 17.00 -10 TATAAT (2 matches; spacers 17:2)
";

#[test]
fn screen_reads_nested_and_gzipped_records() {
    let fx = fixture();
    let orchestrator = Orchestrator::new(options(RecordPolicy::Skip)).unwrap();
    let report = orchestrator.run(&fx.reference, &fx.records).unwrap();

    assert_eq!(report.mode, ExecutionMode::Parallel { threads: 2 });
    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.matched, 2);
    assert_eq!(report.summary.not_homologous, 2);
    assert!(report.summary.failures.is_empty());
    assert_eq!(report.consensus.to_string(), EXPECTED_CONSENSUS);

    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].path.ends_with("broken.gbk"));
    assert!(report.to_string().contains("# skipped record"));
}

#[test]
fn strict_policy_aborts_on_malformed_record() {
    let fx = fixture();
    let orchestrator = Orchestrator::new(options(RecordPolicy::Abort)).unwrap();
    let err = orchestrator.run(&fx.reference, &fx.records).unwrap_err();
    assert!(format!("{err:#}").contains("broken.gbk"));
}

#[test]
fn missing_inputs_are_fatal() {
    let fx = fixture();
    let orchestrator = Orchestrator::new(options(RecordPolicy::Skip)).unwrap();
    assert!(
        orchestrator
            .load_inputs(Path::new("/nonexistent/refs.list"), &fx.records)
            .is_err()
    );
    assert!(
        orchestrator
            .load_inputs(&fx.reference, &fx.records.join("missing"))
            .is_err()
    );
}

#[test]
fn compare_mode_finds_runs_equivalent() {
    let fx = fixture();
    let orchestrator = Orchestrator::new(options(RecordPolicy::Skip)).unwrap();
    let inputs = orchestrator.load_inputs(&fx.reference, &fx.records).unwrap();
    assert_eq!(inputs.records.len(), 2);
    assert_eq!(inputs.gene_count(), 2);

    let cmp = orchestrator.compare(&inputs).unwrap();
    assert!(cmp.is_equivalent());
    assert_eq!(cmp.equivalence.compared, 3);
    assert_eq!(cmp.sequential.mode, ExecutionMode::Sequential);
    assert_eq!(cmp.sequential.consensus.to_string(), EXPECTED_CONSENSUS);
    assert!(cmp.speedup() > 0.0);
    assert!(cmp.to_string().contains("# equivalent: yes"));
}

#[test]
fn cancelled_orchestrator_reports_interruption() {
    let fx = fixture();
    let orchestrator = Orchestrator::new(options(RecordPolicy::Skip)).unwrap();
    let inputs = orchestrator.load_inputs(&fx.reference, &fx.records).unwrap();
    orchestrator.cancel_token().cancel();

    let err = orchestrator
        .screen(&inputs, ExecutionMode::Parallel { threads: 2 })
        .unwrap_err();
    assert!(matches!(
        err,
        ScheduleError::Interrupted {
            completed: 0,
            total: 4
        }
    ));
}
