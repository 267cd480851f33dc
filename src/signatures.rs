//! Built-in known-file fingerprints.

use crate::catalog::SignatureCatalog;
use crate::extractor::{apache_directive, lighttpd_number, lighttpd_string, mysqld_setting};
use crate::signature::{Category, Signature};
use crate::Result;

const APACHE_DIRECTIVES: &[(&str, &str)] = &[
    ("apache_server_name", "ServerName"),
    ("apache_server_listen", "Listen"),
    ("apache_server_bind", "BindAddress"),
    ("apache_server_port", "Port"),
    ("apache_server_root", "ServerRoot"),
    ("apache_server_admin", "ServerAdmin"),
    ("apache_document_root", "DocumentRoot"),
    ("apache_pid_file", "PidFile"),
    ("apache_user", "User"),
    ("apache_group", "Group"),
    ("apache_log_level", "LogLevel"),
    ("apache_error_log", "ErrorLog"),
    ("apache_access_log", "CustomLog"),
    ("apache_access_filename", "AccessFileName"),
    ("apache_user_dir", "UserDir"),
    ("apache_script_alias", "ScriptAlias"),
];

const LIGHTTPD_STRINGS: &[(&str, &str)] = &[
    ("lighttpd_name", "server.name"),
    ("lighttpd_bind", "server.bind"),
    ("lighttpd_tag", "server.tag"),
    ("lighttpd_pid_file", "server.pid-file"),
    ("lighttpd_chroot", "server.chroot"),
    ("lighttpd_user", "server.username"),
    ("lighttpd_group", "server.groupname"),
    ("lighttpd_server_root", "server.document-root"),
    ("lighttpd_error_log", "server.errorlog"),
    ("lighttpd_access_log", "accesslog.filename"),
    ("lighttpd_auth", "auth.backend"),
    ("lighttpd_auth_plain_file", "auth.backend.plain.userfile"),
    ("lighttpd_auth_htpasswd_file", "auth.backend.htpasswd.userfile"),
    ("lighttpd_status_url", "status.status-url"),
    ("lighttpd_config_url", "status.config-url"),
    ("lighttpd_ssl", "ssl.engine"),
    ("lighttpd_ssl_pem", "ssl.pemfile"),
];

const LIGHTTPD_NUMBERS: &[(&str, &str)] = &[("lighttpd_port", "server.port")];

const MYSQLD_SETTINGS: &[(&str, &str)] = &[
    ("mysql_user", "user"),
    ("mysql_port", "port"),
    ("mysql_socket", "socket"),
    ("mysql_log", "log-error"),
    ("mysql_data_dir", "datadir"),
    ("mysql_bind", "bind-address"),
];

pub fn builtin_catalog() -> Result<SignatureCatalog> {
    let mut builder = SignatureCatalog::builder();

    for signature in system_files()
        .into_iter()
        .chain(config_files())
        .chain(log_files())
        .chain(test_files())
    {
        builder = builder.register(signature?);
    }

    Ok(builder.build())
}

fn system_files() -> Vec<Result<Signature>> {
    vec![
        Signature::builder("passwd", Category::SystemFile)
            .path("linux", "/etc/passwd")
            .path("solaris", "/etc/passwd")
            .recognizer(r"root:[^:\n]*:0:0:")
            .build(),
        Signature::builder("group", Category::SystemFile)
            .path("linux", "/etc/group")
            .path("solaris", "/etc/group")
            .recognizer(r"root:[^:\n]*:0:")
            .build(),
        Signature::builder("fstab", Category::SystemFile)
            .path("linux", "/etc/fstab")
            .recognizer(r"/?proc\s+(-\s+)?/proc\s+proc")
            .build(),
        Signature::builder("mtab", Category::SystemFile)
            .path("linux", "/etc/mtab")
            .recognizer(r"proc\s+/proc\s+proc")
            .build(),
        Signature::builder("boot.ini", Category::SystemFile)
            .path("windows", "/boot.ini")
            .recognizer(r"(?i)\[boot\s*loader\]")
            .build(),
        Signature::builder("win.ini", Category::SystemFile)
            .path("windows", "/windows/win.ini")
            .path("windows", "/winnt/win.ini")
            .recognizer(r"\[(fonts|extensions|mci extensions)\]")
            .build(),
    ]
}

fn config_files() -> Vec<Result<Signature>> {
    let mut apache = Signature::builder("apache.conf", Category::ConfigFile)
        .paths(
            "linux",
            [
                "/etc/apache/apache.conf",
                "/etc/apache2/apache2.conf",
                "/etc/apache2/apache.conf",
                "/etc/httpd/conf/httpd.conf",
            ],
        )
        // Stock Debian/Ubuntu configs ship with ServerRoot commented out.
        .recognizer(r"(?m)^[ \t]*#?[ \t]*(ServerRoot|PidFile|AccessFileName)\b");
    for (field, directive) in APACHE_DIRECTIVES {
        apache = apache.extract(field, &apache_directive(directive));
    }

    let mut lighttpd = Signature::builder("lighttpd.conf", Category::ConfigFile)
        .path("linux", "/etc/lighttpd/lighttpd.conf")
        .recognizer(r"server\.modules");
    for (field, setting) in LIGHTTPD_STRINGS {
        lighttpd = lighttpd.extract(field, &lighttpd_string(setting));
    }
    for (field, setting) in LIGHTTPD_NUMBERS {
        lighttpd = lighttpd.extract(field, &lighttpd_number(setting));
    }

    let mut mysql = Signature::builder("my.cnf", Category::ConfigFile)
        .paths("linux", ["/etc/mysql/my.cnf", "/etc/my.cnf"])
        .recognizer(r"(?m)^\[mysql[^\]]*\]");
    for (field, setting) in MYSQLD_SETTINGS {
        mysql = mysql.extract(field, &mysqld_setting(setting));
    }

    vec![apache.build(), lighttpd.build(), mysql.build()]
}

fn log_files() -> Vec<Result<Signature>> {
    vec![
        Signature::builder("rewrite.log", Category::LogFile)
            .paths(
                "linux",
                ["/var/log/apache/rewrite.log", "/var/log/apache2/rewrite.log"],
            )
            .recognizer(r"init rewrite engine with requested uri")
            .build(),
        Signature::builder("syslog.conf", Category::LogFile)
            .path("linux", "/etc/syslog.conf")
            .path("solaris", "/etc/syslog.conf")
            .recognizer(r"kern\.(\*|emerg|alert|crit|err|warn(ing)?|notice|info|debug)")
            .build(),
        // Loosest recognizer in the catalog; keep it last.
        Signature::builder("wtmp", Category::LogFile)
            .path("linux", "/var/log/wtmp")
            .path("solaris", "/var/adm/wtmpx")
            .recognizer(r"(tty\d+|pts/\d+)")
            .build(),
    ]
}

fn test_files() -> Vec<Result<Signature>> {
    vec![
        Signature::builder("group", Category::TestFile)
            .path("linux", "/etc/group")
            .path("solaris", "/etc/group")
            .recognizer(r"root:")
            .build(),
        Signature::builder("boot.ini", Category::TestFile)
            .path("windows", "/boot.ini")
            .recognizer(r"(?i)\[boot\s*loader\]")
            .build(),
    ]
}
