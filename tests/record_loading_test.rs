use std::io::Write;

use chrono::NaiveDate;
use patent_hub::models::job::{IssueKind, LoadPolicy, RecordSet};

const CARDS: &str = r#"[
    {
        "id": "PH001",
        "title": "特許技術者（機械・電気）",
        "company": "ABC特許事務所",
        "category": "特許技術者",
        "location": "東京都港区",
        "experience": "3-5年",
        "salaryMin": "5000",
        "salaryMax": "8000",
        "date": "2025-07-01"
    },
    {
        "jobId": "PH002",
        "title": "弁理士",
        "company": "XYZ国際特許事務所",
        "category": "弁理士",
        "location": "大阪府大阪市",
        "experience": "5年以上",
        "salary_min": 6000,
        "salary_max": 12000,
        "postedDate": "2025/06/28"
    },
    {
        "title": "特許事務スタッフ",
        "company": "DEF特許事務所",
        "category": "特許事務",
        "location": "リモート可",
        "experience": "未経験可",
        "salaryMin": "abc",
        "salaryMax": "4500",
        "date": "2025-06-30"
    },
    {
        "id": "PH004",
        "title": "知財部スタッフ",
        "company": "GHI株式会社",
        "category": "企業知財",
        "location": "愛知県名古屋市",
        "experience": "1-3年",
        "salaryMin": 4000,
        "salaryMax": 6000,
        "date": "not a date"
    },
    {
        "id": "PH001",
        "title": "duplicate",
        "company": "ABC特許事務所",
        "category": "特許技術者",
        "location": "東京都",
        "experience": "3-5年",
        "salaryMin": 1,
        "salaryMax": 2,
        "date": "2025-07-02"
    }
]"#;

#[test]
fn strict_policy_rejects_unusable_salaries() {
    let report = RecordSet::from_json_str(CARDS, LoadPolicy::Strict).unwrap();
    let ids: Vec<&str> = report.records.records().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["PH001", "PH002", "PH004"]);
    assert_eq!(report.rejected(), 2);

    let malformed = report
        .issues
        .iter()
        .find(|issue| issue.position == 3)
        .unwrap();
    assert_eq!(malformed.id, "job_3");
    assert!(malformed.rejected);
    assert!(matches!(
        malformed.kind,
        IssueKind::MalformedSalary { field: "salaryMin", .. }
    ));
}

#[test]
fn coerce_policy_keeps_cards_with_zero_salary() {
    let report = RecordSet::from_json_str(CARDS, LoadPolicy::Coerce).unwrap();
    assert_eq!(report.records.len(), 4);
    assert_eq!(report.rejected(), 1);

    let coerced = report.records.get("job_3").unwrap();
    assert_eq!(coerced.salary_min, 0);
    assert_eq!(coerced.salary_max, 4500);
    assert!(report
        .issues
        .iter()
        .any(|issue| issue.position == 3 && !issue.rejected));
}

#[test]
fn numeric_strings_and_aliases_are_read() {
    let report = RecordSet::from_json_str(CARDS, LoadPolicy::Strict).unwrap();

    let first = report.records.get("PH001").unwrap();
    assert_eq!((first.salary_min, first.salary_max), (5000, 8000));
    assert_eq!(first.posted_date, NaiveDate::from_ymd_opt(2025, 7, 1));

    let second = report.records.get("PH002").unwrap();
    assert_eq!((second.salary_min, second.salary_max), (6000, 12000));
    assert_eq!(second.posted_date, NaiveDate::from_ymd_opt(2025, 6, 28));
}

#[test]
fn invalid_dates_are_kept_undated() {
    let report = RecordSet::from_json_str(CARDS, LoadPolicy::Strict).unwrap();
    let record = report.records.get("PH004").unwrap();
    assert_eq!(record.posted_date, None);

    let issue = report
        .issues
        .iter()
        .find(|issue| issue.id == "PH004")
        .unwrap();
    assert!(!issue.rejected);
    assert_eq!(
        issue.kind,
        IssueKind::InvalidDate {
            value: "not a date".to_string()
        }
    );
}

#[test]
fn duplicate_ids_keep_the_first_card() {
    for policy in [LoadPolicy::Strict, LoadPolicy::Coerce] {
        let report = RecordSet::from_json_str(CARDS, policy).unwrap();
        assert_eq!(report.records.get("PH001").unwrap().title, "特許技術者（機械・電気）");
        let duplicate = report
            .issues
            .iter()
            .find(|issue| issue.position == 5)
            .unwrap();
        assert_eq!(duplicate.kind, IssueKind::DuplicateId);
        assert!(duplicate.rejected);
    }
}

#[test]
fn inverted_range_and_empty_title_are_reported() {
    let raw = r#"[
        {"id": "A", "title": "  ", "salaryMin": 100, "salaryMax": 200, "date": "2025-01-01"},
        {"id": "B", "title": "Clerk", "salaryMin": 900, "salaryMax": 200, "date": "2025-01-01"},
        {"id": "C", "title": "Clerk", "salaryMin": 100, "date": "2025-01-01"}
    ]"#;
    let strict = RecordSet::from_json_str(raw, LoadPolicy::Strict).unwrap();
    assert!(strict.records.is_empty());
    assert_eq!(strict.rejected(), 3);
    assert!(strict
        .issues
        .iter()
        .any(|issue| issue.kind == IssueKind::InvertedSalary { min: 900, max: 200 }));
    assert!(strict
        .issues
        .iter()
        .any(|issue| issue.kind == IssueKind::MissingSalary { field: "salaryMax" }));

    let coerced = RecordSet::from_json_str(raw, LoadPolicy::Coerce).unwrap();
    assert_eq!(coerced.records.len(), 3);
    assert_eq!(coerced.records.get("C").unwrap().salary_max, 0);
}

#[test]
fn malformed_documents_are_errors() {
    assert!(RecordSet::from_json_str("{\"id\": 1}", LoadPolicy::Strict).is_err());
}

#[test]
fn loads_from_a_file() {
    let path = std::env::temp_dir().join(format!("patent-hub-jobs-{}.json", uuid::Uuid::new_v4()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(CARDS.as_bytes()).unwrap();
    drop(file);

    let report = RecordSet::load_from_path(&path, LoadPolicy::Strict).unwrap();
    assert_eq!(report.records.len(), 3);
    std::fs::remove_file(&path).unwrap();

    assert!(RecordSet::load_from_path(&path, LoadPolicy::Strict).is_err());
}

#[test]
fn ids_clashing_with_company_keys_are_rejected() {
    let raw = r#"[
        {"id": "company_7", "title": "Clerk", "salaryMin": 100, "salaryMax": 200, "date": "2025-01-01"},
        {"id": "PH010", "title": "Clerk", "salaryMin": 100, "salaryMax": 200, "date": "2025-01-01"}
    ]"#;
    for policy in [LoadPolicy::Strict, LoadPolicy::Coerce] {
        let report = RecordSet::from_json_str(raw, policy).unwrap();
        assert!(report.records.get("company_7").is_none());
        assert!(report.records.get("PH010").is_some());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::ReservedId);
        assert!(report.issues[0].rejected);
    }
}
