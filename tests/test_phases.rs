#[cfg(test)]
mod tests {
    use std::io::Write;

    use kmer_census::engine::codec::WindowParams;
    use kmer_census::engine::phases::{ExtractPolicy, Mode, Run};
    use kmer_census::engine::scanner::MaskPolicy;
    use tempfile::NamedTempFile;

    fn write_fasta(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp fasta");
        file.write_all(contents.as_bytes()).expect("write temp fasta");
        file
    }

    #[test]
    fn hist_reports_one_bin_for_a_single_homopolymer_window() {
        // Concrete scenario 1 from the specification: one all-A window of
        // length 15, canonical off, should produce a single histogram row.
        let fasta = write_fasta(">r\nAAAAAAAAAAAAAAA\n");
        let params = WindowParams::new(15, 15, 0).unwrap();
        let run = Run {
            params: &params,
            canonical: false,
            in_path: None,
            out_path: None,
            input_files: std::slice::from_ref(&fasta.path().to_path_buf()),
            mode: Mode::Hist,
            extract_policy: None,
            quiet: true,
        };

        let mut out = Vec::new();
        run.execute(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1 1\n");
    }

    #[test]
    fn extract_emits_record_when_cutoff_met_and_nothing_below_it() {
        // Concrete scenarios 4 and 5: with the table preloaded so every
        // window is in-band, a cutoff of 1 emits the record unmasked with
        // kmer_hits = 16, while a cutoff of 100 emits nothing.
        let fasta = write_fasta(&format!(">r\n{}\n", "A".repeat(30)));
        let params = WindowParams::new(15, 15, 0).unwrap();

        let low_cutoff = ExtractPolicy {
            min_val: 1,
            max_val: 999,
            cutoff: Some(1),
            max_difference: None,
            mask_policy: MaskPolicy::Normal,
        };
        let run = Run {
            params: &params,
            canonical: false,
            in_path: None,
            out_path: None,
            input_files: std::slice::from_ref(&fasta.path().to_path_buf()),
            mode: Mode::Extract,
            extract_policy: Some(&low_cutoff),
            quiet: true,
        };
        let mut out = Vec::new();
        run.execute(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, format!(">r 16\n{}\n", "A".repeat(30)));

        let high_cutoff = ExtractPolicy {
            min_val: 1,
            max_val: 999,
            cutoff: Some(100),
            max_difference: None,
            mask_policy: MaskPolicy::Normal,
        };
        let run = Run {
            params: &params,
            canonical: false,
            in_path: None,
            out_path: None,
            input_files: std::slice::from_ref(&fasta.path().to_path_buf()),
            mode: Mode::Extract,
            extract_policy: Some(&high_cutoff),
            quiet: true,
        };
        let mut out = Vec::new();
        run.execute(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn build_then_save_then_load_skips_build_on_rerun() {
        let fasta = write_fasta(">r\nACGTACGTACGTACGTA\n");
        let params = WindowParams::new(17, 17, 0).unwrap();
        let table_file = NamedTempFile::new().unwrap();

        let run = Run {
            params: &params,
            canonical: false,
            in_path: None,
            out_path: Some(table_file.path()),
            input_files: std::slice::from_ref(&fasta.path().to_path_buf()),
            mode: Mode::Hist,
            extract_policy: None,
            quiet: true,
        };
        let mut out = Vec::new();
        run.execute(&mut out).unwrap();
        let built_report = String::from_utf8(out).unwrap();
        assert_eq!(built_report, "1 1\n");

        // Reloading the saved table (with no input-derived BUILD) reproduces
        // the same histogram from the persisted counts alone.
        let run = Run {
            params: &params,
            canonical: false,
            in_path: Some(table_file.path()),
            out_path: None,
            input_files: &[],
            mode: Mode::Hist,
            extract_policy: None,
            quiet: true,
        };
        let mut out = Vec::new();
        run.execute(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), built_report);
    }

    #[test]
    fn fastq_input_is_counted_the_same_as_equivalent_fasta() {
        let fastq = write_fasta(&format!(
            "@r\n{}\n+\n{}\n",
            "A".repeat(15),
            "I".repeat(15)
        ));
        let params = WindowParams::new(15, 15, 0).unwrap();
        let run = Run {
            params: &params,
            canonical: false,
            in_path: None,
            out_path: None,
            input_files: std::slice::from_ref(&fastq.path().to_path_buf()),
            mode: Mode::Hist,
            extract_policy: None,
            quiet: true,
        };
        let mut out = Vec::new();
        run.execute(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1 1\n");
    }

    #[test]
    fn rejects_malformed_input_missing_leading_marker() {
        let bogus = write_fasta("ACGTACGTACGTACGT\n");
        let params = WindowParams::new(15, 15, 0).unwrap();
        let run = Run {
            params: &params,
            canonical: false,
            in_path: None,
            out_path: None,
            input_files: std::slice::from_ref(&bogus.path().to_path_buf()),
            mode: Mode::Hist,
            extract_policy: None,
            quiet: true,
        };
        let mut out = Vec::new();
        assert!(run.execute(&mut out).is_err());
    }
}
