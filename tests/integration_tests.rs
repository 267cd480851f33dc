use lfiscan::{
    build_path,
    cli::ExitStatus,
    catalog::SignatureCatalog,
    config::{Config, OutputFormat},
    escape::{Escape, TraversalSpec},
    extractor,
    file::{mirror_relative_path, IncludedFile},
    matcher::{classify, classify_all},
    signature::{Category, Signature},
    HttpMethod, Result, ScanError, ScanTarget,
};
use std::sync::Arc;

fn passwd_signature() -> Signature {
    Signature::builder("passwd", Category::SystemFile)
        .path("linux", "/etc/passwd")
        .recognizer("root:")
        .build()
        .unwrap()
}

#[test]
fn test_depth_produces_exact_segment_count() {
    for separator in ['/', '\\'] {
        for depth in 0..8 {
            let spec = TraversalSpec::depth(depth).with_separator(separator);
            let path = build_path(&spec, "/etc/passwd");

            if depth == 0 {
                assert_eq!(path, "/etc/passwd");
                continue;
            }

            let sep = separator.to_string();
            let expected = format!("{}{}{}", vec![".."; depth].join(&sep), sep, "/etc/passwd");
            assert_eq!(path, expected);
            assert_eq!(path.matches("..").count(), depth);
        }
    }
}

#[test]
fn test_null_terminator_appends_single_nul() {
    for depth in [0, 1, 5] {
        let plain = build_path(&TraversalSpec::depth(depth), "/etc/passwd");
        let terminated = build_path(
            &TraversalSpec::depth(depth).with_null_terminator(true),
            "/etc/passwd",
        );

        assert!(terminated.ends_with('\0'));
        assert_eq!(terminated.matches('\0').count(), 1);
        assert_eq!(&terminated[..terminated.len() - 1], plain);
    }
}

#[test]
fn test_literal_prefix_overrides_depth() {
    let spec = TraversalSpec::prefix("/var/www/../..");
    assert_eq!(spec.escape, Escape::Prefix("/var/www/../..".to_string()));
    assert_eq!(spec.escape_depth(), None);
    assert_eq!(spec.build_path("etc/passwd"), "/var/www/../../etc/passwd");
}

#[test]
fn test_signature_requires_recognizer() {
    let missing = Signature::builder("nothing", Category::TestFile)
        .path("linux", "/etc/nothing")
        .build();
    assert!(matches!(missing, Err(ScanError::InvalidSignature { .. })));

    let empty = Signature::builder("empty", Category::TestFile)
        .recognizer("")
        .build();
    assert!(matches!(empty, Err(ScanError::InvalidSignature { .. })));

    let broken = Signature::builder("broken", Category::TestFile)
        .recognizer("(unclosed")
        .build();
    assert!(matches!(broken, Err(ScanError::Pattern(_))));

    let broken_extractor = Signature::builder("broken", Category::TestFile)
        .recognizer("ok")
        .extract("field", "[")
        .build();
    assert!(matches!(broken_extractor, Err(ScanError::Pattern(_))));
}

#[test]
fn test_paths_for_os_filter() {
    let sig = Signature::builder("group", Category::SystemFile)
        .path("Linux", "/etc/group")
        .path("solaris", "/etc/group")
        .path("linux", "/etc/group-")
        .recognizer("root:")
        .build()
        .unwrap();

    assert_eq!(sig.paths_for(Some("linux")), vec!["/etc/group", "/etc/group-"]);
    assert_eq!(sig.paths_for(Some("LINUX")), vec!["/etc/group", "/etc/group-"]);
    assert_eq!(sig.paths_for(Some("solaris")), vec!["/etc/group"]);
    assert!(sig.paths_for(Some("windows")).is_empty());
    assert_eq!(sig.paths_for(None), vec!["/etc/group", "/etc/group-", "/etc/group"]);
    assert_eq!(sig.operating_systems().collect::<Vec<_>>(), vec!["linux", "solaris"]);
}

#[test]
fn test_catalog_orders_by_category() -> Result<()> {
    let catalog = SignatureCatalog::builder()
        .register(
            Signature::builder("wtmp", Category::LogFile)
                .path("linux", "/var/log/wtmp")
                .recognizer(r"tty\d+")
                .build()?,
        )
        .register(
            Signature::builder("canary", Category::TestFile)
                .path("linux", "/etc/group")
                .recognizer("root:")
                .build()?,
        )
        .register(passwd_signature())
        .register(
            Signature::builder("my.cnf", Category::ConfigFile)
                .path("linux", "/etc/mysql/my.cnf")
                .recognizer(r"\[mysqld\]")
                .build()?,
        )
        .build();

    let names: Vec<String> = catalog.all().iter().map(|s| s.name().to_string()).collect();
    assert_eq!(names, vec!["passwd", "my.cnf", "wtmp", "canary"]);
    assert_eq!(
        catalog.categories(),
        vec![Category::SystemFile, Category::ConfigFile, Category::LogFile, Category::TestFile]
    );

    let logs = catalog.select(&[Category::LogFile])?;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].name(), "wtmp");
    Ok(())
}

#[test]
fn test_unknown_category() {
    let catalog = SignatureCatalog::builder().register(passwd_signature()).build();

    assert!(matches!(
        catalog.category(Category::LogFile),
        Err(ScanError::UnknownSignatureCategory(_))
    ));
    assert!(matches!(
        catalog.select(&[Category::SystemFile, Category::ConfigFile]),
        Err(ScanError::UnknownSignatureCategory(_))
    ));
    assert!(matches!(
        "firmware".parse::<Category>(),
        Err(ScanError::UnknownSignatureCategory(_))
    ));
    assert_eq!("config".parse::<Category>().unwrap(), Category::ConfigFile);
}

#[test]
fn test_builtin_catalog() -> Result<()> {
    let catalog = SignatureCatalog::builtin()?;
    let all = catalog.all();

    assert!(!all.is_empty());
    assert_eq!(all[0].name(), "passwd");
    assert_eq!(catalog.categories().first(), Some(&Category::SystemFile));
    assert!(catalog.find("apache.conf").is_some());
    assert!(catalog.category(Category::TestFile)?.len() >= 2);

    let windows: Vec<&str> = all.iter().flat_map(|s| s.paths_for(Some("windows"))).collect();
    assert!(windows.contains(&"/boot.ini"));
    Ok(())
}

#[test]
fn test_builtin_recognizers() -> Result<()> {
    let catalog = SignatureCatalog::builtin()?;
    let all = catalog.all();

    let passwd = "root:x:0:0:root:/root:/bin/bash\ndaemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin\n";
    assert_eq!(classify(passwd, &all).unwrap().signature.name(), "passwd");

    let boot_ini = "[boot loader]\ntimeout=30\ndefault=multi(0)disk(0)rdisk(0)partition(1)\\WINDOWS\n";
    let found = classify(boot_ini, &all).unwrap();
    assert_eq!(found.signature.name(), "boot.ini");
    assert_eq!(found.signature.category(), Category::SystemFile);

    assert!(classify("<html><body>Welcome</body></html>", &all).is_none());
    Ok(())
}

#[test]
fn test_apache_server_root_extraction() -> Result<()> {
    let catalog = SignatureCatalog::builtin()?;
    let apache = catalog.find("apache.conf").unwrap();

    let body = "# Global configuration\nServerRoot \"/var/www\"\nListen 8080\nUser www-data\n#DocumentRoot \"/disabled\"\n";
    let fields = apache.extract(body);
    assert_eq!(fields.get("apache_server_root").map(String::as_str), Some("/var/www"));
    assert_eq!(fields.get("apache_server_listen").map(String::as_str), Some("8080"));
    assert_eq!(fields.get("apache_user").map(String::as_str), Some("www-data"));
    assert!(!fields.contains_key("apache_document_root"));

    let without = apache.extract("Listen 80\n");
    assert!(!without.contains_key("apache_server_root"));
    assert_eq!(without.get("apache_server_listen").map(String::as_str), Some("80"));
    Ok(())
}

#[test]
fn test_mysql_and_lighttpd_extraction() -> Result<()> {
    let catalog = SignatureCatalog::builtin()?;

    let mysql = catalog.find("my.cnf").unwrap();
    let body = "[client]\nport = 3306\n\n[mysqld]\nuser = mysql\ndatadir = /var/lib/mysql\nbind-address = 127.0.0.1\n";
    assert!(mysql.recognizes(body));
    let fields = mysql.extract(body);
    assert_eq!(fields.get("mysql_user").map(String::as_str), Some("mysql"));
    assert_eq!(fields.get("mysql_data_dir").map(String::as_str), Some("/var/lib/mysql"));
    assert_eq!(fields.get("mysql_bind").map(String::as_str), Some("127.0.0.1"));
    assert!(!fields.contains_key("mysql_port"));

    let lighttpd = catalog.find("lighttpd.conf").unwrap();
    let body = "server.modules = ( \"mod_access\" )\nserver.document-root = \"/srv/www\"\nserver.port = 80\n# server.username = \"nobody\"\n";
    let fields = lighttpd.extract(body);
    assert_eq!(fields.get("lighttpd_server_root").map(String::as_str), Some("/srv/www"));
    assert_eq!(fields.get("lighttpd_port").map(String::as_str), Some("80"));
    assert!(!fields.contains_key("lighttpd_user"));
    Ok(())
}

#[test]
fn test_extraction_is_idempotent() -> Result<()> {
    let mut fields = extractor::Extractor::new();
    fields.add("root", &extractor::apache_directive("ServerRoot"))?;
    fields.add("missing", &extractor::apache_directive("DocumentRoot"))?;

    let body = "ServerRoot \"/etc/apache2\"\n";
    let first = fields.extract(body);
    let second = fields.extract(body);
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    Ok(())
}

#[test]
fn test_classify_prefers_earliest_signature() -> Result<()> {
    let passwd = Arc::new(passwd_signature());
    let body = "root:x:0:0:root:/root:/bin/bash\n";

    let mut signatures = vec![Arc::clone(&passwd)];
    assert_eq!(classify(body, &signatures).unwrap().signature.name(), "passwd");

    signatures.push(Arc::new(
        Signature::builder("loose", Category::LogFile)
            .path("linux", "/var/log/anything")
            .recognizer(r":\d+")
            .build()?,
    ));

    let first = classify(body, &signatures).unwrap();
    assert!(Arc::ptr_eq(&first.signature, &passwd));

    let all = classify_all(body, &signatures);
    assert_eq!(all.len(), 2);
    assert!(Arc::ptr_eq(&all[0].signature, &first.signature));
    assert_eq!(all[1].signature.name(), "loose");
    Ok(())
}

#[test]
fn test_scan_target_parsing() -> Result<()> {
    let target = ScanTarget::parse("http://example.com/page.php?file=home&lang=en#top")?;
    assert_eq!(target.param_names(), vec!["file", "lang"]);
    assert_eq!(target.base().as_str(), "http://example.com/page.php");
    assert_eq!(target.params_to_test(None)?, vec!["file", "lang"]);
    assert_eq!(target.params_to_test(Some("lang"))?, vec!["lang"]);

    let url = target.url_with_param("file", "../etc/passwd");
    assert_eq!(url.query(), Some("file=..%2Fetc%2Fpasswd&lang=en"));

    assert!(matches!(ScanTarget::parse("not a url"), Err(ScanError::InvalidTarget(_))));
    assert!(matches!(ScanTarget::parse("ftp://example.com/?a=1"), Err(ScanError::InvalidTarget(_))));
    assert!(matches!(
        ScanTarget::parse("http://example.com/")?.params_to_test(None),
        Err(ScanError::InvalidTarget(_))
    ));
    assert!(matches!(target.params_to_test(Some("id")), Err(ScanError::InvalidTarget(_))));
    Ok(())
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.scan.min_depth, 0);
    assert_eq!(config.scan.max_depth, 15);
    assert_eq!(config.scan.separator, '/');
    assert!(!config.scan.terminate_with_null);
    assert!(!config.scan.exhaustive);
    assert_eq!(config.scan.method, HttpMethod::Get);
    assert_eq!(config.scan.workers, 1);
    assert!(config.scan.categories.is_empty());

    assert_eq!(config.http.timeout, 10);
    assert_eq!(config.http.request_timeout(), std::time::Duration::from_secs(10));
    assert!(config.http.follow_redirects);
    assert_eq!(config.http.max_redirects, 5);
    assert!(!config.http.verify_ssl);

    assert_eq!(config.reporting.output_dir.to_string_lossy(), "./reports");
    assert_eq!(config.reporting.formats, vec![OutputFormat::Json]);

    assert_eq!(config.depth_range(), 0..=15);
    assert_eq!(config.traversal(3), TraversalSpec::depth(3));
}

#[test]
fn test_config_prefix_traversal() {
    let mut config = Config::default();
    config.scan.prefix = Some("/var/www/html/../../..".to_string());
    config.scan.terminate_with_null = true;

    let spec = config.traversal(7);
    assert_eq!(spec.escape, Escape::Prefix("/var/www/html/../../..".to_string()));
    assert!(spec.terminate_with_null);
}

#[test]
fn test_config_save_and_load() -> Result<()> {
    use tempfile::Builder;

    let mut config = Config::default();
    config.scan.max_depth = 8;
    config.scan.os = Some("linux".to_string());
    config.scan.method = HttpMethod::Post;

    let temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
    let temp_path = temp_file.path().to_str().unwrap();

    config.save_to_file(temp_path)?;
    let loaded_config = Config::load_from_file(temp_path)?;

    assert_eq!(loaded_config.scan.max_depth, 8);
    assert_eq!(loaded_config.scan.os.as_deref(), Some("linux"));
    assert_eq!(loaded_config.scan.method, HttpMethod::Post);
    assert_eq!(loaded_config.scan.separator, '/');
    assert_eq!(loaded_config.http.timeout, config.http.timeout);
    Ok(())
}

#[tokio::test]
async fn test_included_file_mirror() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let file = IncludedFile::new("/etc/passwd", "root:x:0:0:root:/root:/bin/bash\n");

    let saved = file.mirror(dir.path()).await?;
    assert_eq!(saved, dir.path().join("etc").join("passwd"));
    assert_eq!(tokio::fs::read_to_string(&saved).await?, file.body);

    let copy = dir.path().join("copy.txt");
    assert_eq!(file.save(&copy).await?, copy);
    assert_eq!(tokio::fs::read_to_string(&copy).await?, file.body);
    Ok(())
}

#[test]
fn test_mirror_path_stays_inside_base() {
    assert_eq!(mirror_relative_path("/etc/passwd"), std::path::PathBuf::from("etc/passwd"));
    assert_eq!(mirror_relative_path("/../../etc/shadow"), std::path::PathBuf::from("etc/shadow"));
    assert_eq!(mirror_relative_path("\\windows\\win.ini"), std::path::PathBuf::from("windows/win.ini"));
}

#[test]
fn test_time_utilities() {
    use lfiscan::utils::time;
    use std::time::Duration;

    assert_eq!(time::format_duration(Duration::from_secs(3661)), "1h 1m 1s");
    assert_eq!(time::format_duration(Duration::from_secs(61)), "1m 1s");
    assert_eq!(time::format_duration(Duration::from_secs(1)), "1s");
    assert!(time::now_utc().timestamp() > 0);
}

#[test]
fn test_text_utilities() {
    use lfiscan::utils::text;

    assert_eq!(text::printable("/etc/passwd\0"), "/etc/passwd\\0");
    assert_eq!(text::truncate_with_ellipsis("abcdefghij", 6), "abc...");
    assert_eq!(text::truncate_with_ellipsis("abc", 6), "abc");
}

#[tokio::test]
async fn test_report_generation() -> Result<()> {
    use lfiscan::reporting::{ReportGenerator, ScanReport};
    use lfiscan::Vulnerability;

    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.reporting.output_dir = dir.path().to_path_buf();
    config.reporting.formats = vec![OutputFormat::Json, OutputFormat::Csv];

    let catalog = SignatureCatalog::builtin()?;
    let vuln = Vulnerability {
        url: "http://victim.test/?file=%2Fetc%2Fpasswd".to_string(),
        param: "file".to_string(),
        traversal: TraversalSpec::depth(0),
        signature: catalog.find("passwd").unwrap(),
        matched_path: "/etc/passwd".to_string(),
        extracted_fields: Default::default(),
        body: "root:x:0:0:root:/root:/bin/bash\n".to_string(),
        discovered_at: chrono::Utc::now(),
    };

    let mut report = ScanReport::new("http://victim.test/?file=home", false);
    report.probes_sent = 1;
    report.record(&vuln);
    report.complete();

    let generator = ReportGenerator::new(config);
    let files = generator.generate_report(&report).await?;
    assert_eq!(files.len(), 2);

    let json = tokio::fs::read_to_string(&files[0]).await?;
    let parsed: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(parsed["vulnerabilities"][0]["signature"], "passwd");
    assert_eq!(parsed["vulnerabilities"][0]["category"], "system");
    assert!(parsed["completed_at"].is_string());

    let csv = tokio::fs::read_to_string(&files[1]).await?;
    assert!(csv.starts_with("target,url,param,traversal,signature,category"));
    assert!(csv.contains("/etc/passwd"));

    let mirrored = generator.mirror_files(&[vuln], &dir.path().join("loot")).await?;
    assert_eq!(mirrored, vec![dir.path().join("loot").join("etc").join("passwd")]);
    Ok(())
}

#[test]
fn test_apache_recognized_with_commented_server_root() -> Result<()> {
    let catalog = SignatureCatalog::builtin()?;
    let apache = catalog.find("apache.conf").unwrap();

    let debian = "# This is the main Apache server configuration file.\n\
#ServerRoot \"/etc/apache2\"\n\
DefaultRuntimeDir ${APACHE_RUN_DIR}\n\
PidFile ${APACHE_PID_FILE}\n\
Timeout 300\n\
User ${APACHE_RUN_USER}\n\
Group ${APACHE_RUN_GROUP}\n\
ErrorLog ${APACHE_LOG_DIR}/error.log\n\
LogLevel warn\n\
AccessFileName .htaccess\n";

    assert!(apache.recognizes(debian));
    let found = classify(debian, &catalog.select(&[Category::ConfigFile])?).unwrap();
    assert_eq!(found.signature.name(), "apache.conf");

    let fields = found.extracted_fields;
    assert!(!fields.contains_key("apache_server_root"));
    assert_eq!(fields.get("apache_pid_file").map(String::as_str), Some("${APACHE_PID_FILE}"));
    assert_eq!(fields.get("apache_user").map(String::as_str), Some("${APACHE_RUN_USER}"));
    assert_eq!(fields.get("apache_access_filename").map(String::as_str), Some(".htaccess"));

    assert!(!apache.recognizes("server.modules = ( \"mod_access\" )\n"));
    Ok(())
}

#[test]
fn test_config_validation() {
    assert!(Config::default().validate().is_ok());

    let mut inverted = Config::default();
    inverted.scan.min_depth = 5;
    inverted.scan.max_depth = 2;
    assert!(matches!(inverted.validate(), Err(ScanError::InvalidInput(_))));

    let mut too_deep = Config::default();
    too_deep.scan.max_depth = lfiscan::config::DEPTH_LIMIT + 1;
    assert!(matches!(too_deep.validate(), Err(ScanError::InvalidInput(_))));

    let mut deepest = Config::default();
    deepest.scan.max_depth = lfiscan::config::DEPTH_LIMIT;
    assert!(deepest.validate().is_ok());

    let mut no_workers = Config::default();
    no_workers.scan.workers = 0;
    assert!(no_workers.validate().is_err());

    let mut prefixed = inverted.clone();
    prefixed.scan.prefix = Some("/var/www/..".to_string());
    assert!(prefixed.validate().is_ok());

    assert!(ScanError::InvalidInput(String::new()).is_input_error());
}

#[test]
fn test_exit_status_for_scan() {
    assert_eq!(ExitStatus::for_scan(false, 1, false), ExitStatus::Success);
    assert_eq!(ExitStatus::for_scan(false, 0, false), ExitStatus::NotFound);
    assert_eq!(ExitStatus::for_scan(true, 0, false), ExitStatus::Success);

    assert_eq!(ExitStatus::for_scan(false, 0, true), ExitStatus::Aborted);
    assert_eq!(ExitStatus::for_scan(true, 3, true), ExitStatus::Aborted);
    assert_eq!(ExitStatus::for_scan(false, 1, true), ExitStatus::Success);

    assert_eq!(ExitStatus::NotFound.code(), 1);
    assert_eq!(ExitStatus::Error.code(), 2);
    assert_ne!(ExitStatus::Aborted.code(), ExitStatus::NotFound.code());
}
