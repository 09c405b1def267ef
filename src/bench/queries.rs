//! TPC-DS micro-benchmark queries

/// A named benchmark query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicroQuery {
    pub name: &'static str,
    pub sql: &'static str,
}

/// Views the suite registers from `<data_root>/tpcds/<name>`
pub const TPCDS_VIEWS: [&str; 6] = [
    "customer",
    "store_sales",
    "catalog_sales",
    "web_sales",
    "item",
    "date_dim",
];

/// View name of the copied customer sample used by the cross join
pub const SAMPLE_VIEW: &str = "customer_1m";

/// Many conditional distinct counts per group: expands each input row
/// once per distinct aggregate before hashing
pub const EXPAND_HASH_AGGREGATE: MicroQuery = MicroQuery {
    name: "Expand&HashAggregate",
    sql: r#"
SELECT c_current_hdemo_sk,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Ms.' THEN c_salutation END) AS c1,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Mr.' THEN c_salutation END) AS c12,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Dr.' THEN c_salutation END) AS c13,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Ms.' THEN c_first_name END) AS c2,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Mr.' THEN c_first_name END) AS c22,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Dr.' THEN c_first_name END) AS c23,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Ms.' THEN c_last_name END) AS c3,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Mr.' THEN c_last_name END) AS c32,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Dr.' THEN c_last_name END) AS c33,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Ms.' THEN c_birth_country END) AS c4,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Mr.' THEN c_birth_country END) AS c42,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Dr.' THEN c_birth_country END) AS c43,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Ms.' THEN c_email_address END) AS c5,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Mr.' THEN c_email_address END) AS c52,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Dr.' THEN c_email_address END) AS c53,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Ms.' THEN c_login END) AS c6,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Mr.' THEN c_login END) AS c62,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Dr.' THEN c_login END) AS c63,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Ms.' THEN c_preferred_cust_flag END) AS c7,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Mr.' THEN c_preferred_cust_flag END) AS c72,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Dr.' THEN c_preferred_cust_flag END) AS c73,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Ms.' THEN c_birth_month END) AS c8,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Mr.' THEN c_birth_month END) AS c82,
    COUNT(DISTINCT CASE WHEN c_salutation = 'Dr.' THEN c_birth_month END) AS c83,
    AVG(CASE WHEN c_salutation = 'Ms.' THEN c_birth_year END) AS avg1,
    AVG(CASE WHEN c_salutation = 'Mr.' THEN c_birth_year END) AS avg2,
    AVG(CASE WHEN c_salutation = 'Dr.' THEN c_birth_year END) AS avg3,
    AVG(CASE WHEN c_salutation = 'Miss.' THEN c_birth_year END) AS avg4,
    AVG(CASE WHEN c_salutation = 'Mrs.' THEN c_birth_year END) AS avg5,
    AVG(CASE WHEN c_salutation = 'Sir.' THEN c_birth_year END) AS avg6,
    AVG(CASE WHEN c_salutation = 'Professor.' THEN c_birth_year END) AS avg7,
    AVG(CASE WHEN c_salutation = 'Teacher.' THEN c_birth_year END) AS avg8,
    AVG(CASE WHEN c_salutation = 'Agent.' THEN c_birth_year END) AS avg9,
    AVG(CASE WHEN c_salutation = 'Director.' THEN c_birth_year END) AS avg10
FROM customer
GROUP BY c_current_hdemo_sk
"#,
};

/// Sliding window average, null customers filtered out first
pub const WINDOWING_WITHOUT_SKEW: MicroQuery = MicroQuery {
    name: "Windowing without skew",
    sql: r#"
SELECT ss_customer_sk, AVG(avg_price) AS avg_price
FROM (
    SELECT ss_customer_sk,
        AVG(ss_sales_price) OVER (
            PARTITION BY ss_customer_sk
            ORDER BY ss_sold_date_sk
            ROWS BETWEEN 50 PRECEDING AND 50 FOLLOWING
        ) AS avg_price
    FROM store_sales
    WHERE ss_customer_sk IS NOT NULL
) AS windowed
GROUP BY ss_customer_sk
ORDER BY avg_price DESC
"#,
};

/// Same window, but every null customer lands in one partition
pub const WINDOWING_WITH_SKEW: MicroQuery = MicroQuery {
    name: "Windowing with skew",
    sql: r#"
SELECT ss_customer_sk, AVG(avg_price) AS avg_price
FROM (
    SELECT ss_customer_sk,
        AVG(ss_sales_price) OVER (
            PARTITION BY ss_customer_sk
            ORDER BY ss_sold_date_sk
            ROWS BETWEEN 50 PRECEDING AND 50 FOLLOWING
        ) AS avg_price
    FROM store_sales
) AS windowed
GROUP BY ss_customer_sk
ORDER BY avg_price DESC
"#,
};

/// Cross-channel item subquery of TPC-DS Q14a (three-way INTERSECT)
pub const NDS_Q14A_SUBQUERY: MicroQuery = MicroQuery {
    name: "NDS Q14a subquery",
    sql: r#"
SELECT i_item_sk AS ss_item_sk
FROM item,
    (SELECT iss.i_brand_id AS brand_id, iss.i_class_id AS class_id, iss.i_category_id AS category_id
     FROM store_sales, item iss, date_dim d1
     WHERE ss_item_sk = iss.i_item_sk
       AND ss_sold_date_sk = d1.d_date_sk
       AND d1.d_year BETWEEN 1999 AND 1999 + 2
     INTERSECT
     SELECT ics.i_brand_id, ics.i_class_id, ics.i_category_id
     FROM catalog_sales, item ics, date_dim d2
     WHERE cs_item_sk = ics.i_item_sk
       AND cs_sold_date_sk = d2.d_date_sk
       AND d2.d_year BETWEEN 1999 AND 1999 + 2
     INTERSECT
     SELECT iws.i_brand_id, iws.i_class_id, iws.i_category_id
     FROM web_sales, item iws, date_dim d3
     WHERE ws_item_sk = iws.i_item_sk
       AND ws_sold_date_sk = d3.d_date_sk
       AND d3.d_year BETWEEN 1999 AND 1999 + 2) x
WHERE i_brand_id = brand_id
  AND i_class_id = class_id
  AND i_category_id = category_id
"#,
};

/// Non-equi self join over the copied customer sample
pub const CROSS_JOIN: MicroQuery = MicroQuery {
    name: "Crossjoin",
    sql: r#"
SELECT COUNT(*)
FROM customer_1m c1
INNER JOIN customer_1m c2 ON c1.c_customer_sk > c2.c_customer_sk
"#,
};

/// Queries over the registered TPC-DS views, in run order
pub const VIEW_QUERIES: [MicroQuery; 4] = [
    EXPAND_HASH_AGGREGATE,
    WINDOWING_WITHOUT_SKEW,
    WINDOWING_WITH_SKEW,
    NDS_Q14A_SUBQUERY,
];

/// Every benchmark case name, in run order
pub fn case_names() -> Vec<&'static str> {
    VIEW_QUERIES
        .iter()
        .chain(std::iter::once(&CROSS_JOIN))
        .map(|q| q.name)
        .collect()
}

/// Look up a query by case name (case-insensitive)
pub fn get_query(name: &str) -> Option<MicroQuery> {
    VIEW_QUERIES
        .iter()
        .chain(std::iter::once(&CROSS_JOIN))
        .find(|q| q.name.eq_ignore_ascii_case(name))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_cases_resolve() {
        let names = case_names();
        assert_eq!(names.len(), 5);
        for name in names {
            assert_eq!(get_query(name).map(|q| q.name), Some(name));
        }
        assert_eq!(get_query("crossjoin"), Some(CROSS_JOIN));
        assert!(get_query("Q99").is_none());
    }

    #[test]
    fn test_cross_join_reads_sample_view() {
        assert!(CROSS_JOIN.sql.contains(SAMPLE_VIEW));
    }
}
