//! Extracts [`ContractInfo`] from the HTML of a contract's Etherscan page (`/address/<address>`).
//!
//! Etherscan exposes neither the compiler settings nor the verified bytecode in a convenient API form,
//! hence they are read from fixed locations of the page's markup. Each field is described by a [`Rule`]
//! naming the element it lives in, so that a redesign of the page is reported as e.g.
//! `Contract page is missing field 'bytecode'` rather than silently producing garbage:
//!
//! | field             | location                                                          |
//! |-------------------|-------------------------------------------------------------------|
//! | `sourcecode`      | text of the `pre` inside `div#dividcode`                          |
//! | `bytecode`        | first text node of `div#verifiedbytecode2`, hex encoded           |
//! | `name`            | 2nd `td` of `div#ContentPlaceHolder1_contractCodeDiv`             |
//! | `solcVersion`     | 4th `td`                                                          |
//! | `optimized`       | 6th `td`, `false` only for the exact text `No`                    |
//! | `optimizedRounds` | 8th `td`, leading decimal digits                                  |
//!
//! The metadata table alternates label and value cells, so row `n` is read from cell `2 * n + 1`.

use crate::error::Error;
use crate::model::ContractInfo;
use select::document::Document;
use select::node::Node;
use select::predicate::Attr;
use select::predicate::Name;
use select::predicate::Predicate;

const CONTAINER_SOURCECODE: &str = "dividcode";
const CONTAINER_BYTECODE: &str = "verifiedbytecode2";
const CONTAINER_METADATA: &str = "ContentPlaceHolder1_contractCodeDiv";

/// Location of a single field within the page.
struct Rule {
    field: &'static str,
    container: &'static str,
    extract: Extract,
}

enum Extract {
    /// Text of the first `pre` element within the container, entities decoded.
    PreformattedText,

    /// The container's first child, which has to be a text node.
    FirstTextNode,

    /// First child of the value cell of the given metadata table row.
    TableRow(usize),
}

const RULE_SOURCECODE: Rule = Rule {
    field: "sourcecode",
    container: CONTAINER_SOURCECODE,
    extract: Extract::PreformattedText,
};

const RULE_BYTECODE: Rule = Rule {
    field: "bytecode",
    container: CONTAINER_BYTECODE,
    extract: Extract::FirstTextNode,
};

const RULE_NAME: Rule = Rule {
    field: "name",
    container: CONTAINER_METADATA,
    extract: Extract::TableRow(0),
};

const RULE_SOLC_VERSION: Rule = Rule {
    field: "solcVersion",
    container: CONTAINER_METADATA,
    extract: Extract::TableRow(1),
};

const RULE_OPTIMIZED: Rule = Rule {
    field: "optimized",
    container: CONTAINER_METADATA,
    extract: Extract::TableRow(2),
};

const RULE_OPTIMIZED_ROUNDS: Rule = Rule {
    field: "optimizedRounds",
    container: CONTAINER_METADATA,
    extract: Extract::TableRow(3),
};

impl Rule {
    fn apply(&self, document: &Document) -> Result<String, Error> {
        let container = document
            .find(Name("div").and(Attr("id", self.container)))
            .next()
            .ok_or(Error::ScrapeMissingField(self.field))?;

        match self.extract {
            Extract::PreformattedText => container
                .find(Name("pre"))
                .next()
                .map(|pre| pre.text())
                .ok_or(Error::ScrapeMissingField(self.field)),

            Extract::FirstTextNode => container
                .children()
                .next()
                .and_then(|node| node.as_text().map(str::to_string))
                .ok_or(Error::ScrapeMissingField(self.field)),

            Extract::TableRow(row) => container
                .find(Name("td"))
                .nth(row * 2 + 1)
                .map(|cell| first_child_text(&cell).trim().to_string())
                .ok_or(Error::ScrapeMissingField(self.field)),
        }
    }
}

/// Returns the text of the cell's first child, or an empty string for empty cells.
fn first_child_text(cell: &Node) -> String {
    match cell.children().next() {
        Some(child) => match child.as_text() {
            Some(text) => text.to_string(),
            None => child.text(),
        },

        None => String::new(),
    }
}

/// HTML parsers drop a single line feed directly following a `<pre>` start tag, so the DOM alone can't
/// tell whether the verified source began with an empty line. Looks at the raw markup of the first `pre`
/// after the container's id instead.
fn pre_starts_with_newline(html: &str, container: &str) -> bool {
    let start = match html
        .find(&format!("\"{container}\""))
        .or_else(|| html.find(&format!("'{container}'")))
    {
        Some(start) => start,
        None => return false,
    };

    let rest = &html[start..];
    let rest = match rest.find("<pre") {
        Some(pre) => &rest[pre..],
        None => return false,
    };

    match rest.find('>') {
        Some(end) => {
            let content = &rest[end + 1..];
            content.starts_with('\n') || content.starts_with("\r\n")
        }

        None => false,
    }
}

/// Parses the leading decimal digits of `text`, ignoring whatever follows them (e.g. `200 runs`).
fn parse_leading_integer(text: &str) -> Option<u32> {
    let end = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    text[..end].parse().ok()
}

/// Extracts all [`ContractInfo`] fields from a contract page, failing on the first field that is missing
/// or malformed.
pub fn from_contract_page(html: &str) -> Result<ContractInfo, Error> {
    let document = Document::from(html);

    let mut sourcecode = RULE_SOURCECODE.apply(&document)?;
    if pre_starts_with_newline(html, RULE_SOURCECODE.container) {
        sourcecode.insert(0, '\n');
    }

    let bytecode_hex = RULE_BYTECODE.apply(&document)?;
    let bytecode_hex = bytecode_hex.trim();
    let bytecode = hex::decode(bytecode_hex.strip_prefix("0x").unwrap_or(bytecode_hex))
        .map_err(|err| Error::ScrapeInvalidField(RULE_BYTECODE.field, err.to_string()))?;

    let name = RULE_NAME.apply(&document)?;
    let solc_version = RULE_SOLC_VERSION.apply(&document)?;
    let optimized = RULE_OPTIMIZED.apply(&document)? != "No";

    let optimized_rounds = RULE_OPTIMIZED_ROUNDS.apply(&document)?;
    let optimized_rounds = parse_leading_integer(&optimized_rounds).ok_or_else(|| {
        Error::ScrapeInvalidField(RULE_OPTIMIZED_ROUNDS.field, format!("'{optimized_rounds}' is not a number"))
    })?;

    Ok(ContractInfo {
        name,
        solc_version,
        optimized,
        optimized_rounds,
        sourcecode,
        bytecode,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::error::Error;
    use crate::scraper::from_contract_page;
    use pretty_assertions::assert_eq;

    /// Returns a trimmed down contract page in the layout Etherscan uses for verified contracts.
    pub fn contract_page(optimized: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<body>
<div id="ContentPlaceHolder1_contractCodeDiv">
  <table>
    <tr><td>Contract Name:</td><td>
      MetaCoin
    </td></tr>
    <tr><td>Compiler Version:</td><td>v0.4.19+commit.c4cbbb05</td></tr>
    <tr><td>Optimization Enabled:</td><td>{optimized}</td></tr>
    <tr><td>Runs (Optimizer):</td><td> 200 </td></tr>
  </table>
</div>
<div id="dividcode">
  <pre class="js-sourcecopyarea">pragma solidity ^0.4.18;

contract MetaCoin {{
    function isLess(uint a, uint b) returns (bool) {{ return a &lt; b &amp;&amp; b &gt; 0; }}
}}</pre>
</div>
<div id="verifiedbytecode2">0x6060604052</div>
</body>
</html>"#
        )
    }

    #[test]
    fn extract_all_fields() {
        let info = from_contract_page(&contract_page("Yes")).unwrap();

        assert_eq!(info.name, "MetaCoin");
        assert_eq!(info.solc_version, "v0.4.19+commit.c4cbbb05");
        assert!(info.optimized);
        assert_eq!(info.optimized_rounds, 200);
        assert_eq!(info.bytecode, vec![0x60, 0x60, 0x60, 0x40, 0x52]);
        assert_eq!(
            info.sourcecode,
            "pragma solidity ^0.4.18;\n\ncontract MetaCoin {\n    function isLess(uint a, uint b) returns (bool) { return a < b && b > 0; }\n}"
        );
    }

    #[test]
    fn optimized_only_false_for_no() {
        assert!(!from_contract_page(&contract_page("No")).unwrap().optimized);
        assert!(from_contract_page(&contract_page("no")).unwrap().optimized);
        // Cell text is trimmed before comparing
        assert!(!from_contract_page(&contract_page(" No ")).unwrap().optimized);
        assert!(from_contract_page(&contract_page("")).unwrap().optimized);
        assert!(from_contract_page(&contract_page("Yes with 200 runs")).unwrap().optimized);
    }

    #[test]
    fn missing_containers() {
        let page = contract_page("Yes").replace("dividcode", "dividcode-v2");
        assert!(matches!(from_contract_page(&page), Err(Error::ScrapeMissingField("sourcecode"))));

        let page = contract_page("Yes").replace("verifiedbytecode2", "bytecode");
        assert!(matches!(from_contract_page(&page), Err(Error::ScrapeMissingField("bytecode"))));

        let page = contract_page("Yes").replace("ContentPlaceHolder1_contractCodeDiv", "contractCode");
        assert!(matches!(from_contract_page(&page), Err(Error::ScrapeMissingField("name"))));

        // Rate limit pages are plain text
        let page = "Sorry, you have been blocked";
        assert!(matches!(from_contract_page(page), Err(Error::ScrapeMissingField(_))));
    }

    #[test]
    fn missing_table_rows() {
        let page = contract_page("Yes").replace("<tr><td>Runs (Optimizer):</td><td> 200 </td></tr>", "");
        assert!(matches!(from_contract_page(&page), Err(Error::ScrapeMissingField("optimizedRounds"))));
    }

    #[test]
    fn source_keeps_leading_newline() {
        let page = contract_page("Yes").replace(
            r#"<pre class="js-sourcecopyarea">pragma"#,
            "<pre class=\"js-sourcecopyarea\">\npragma",
        );
        let info = from_contract_page(&page).unwrap();
        assert!(info.sourcecode.starts_with("\npragma solidity ^0.4.18;\n"));

        let page = contract_page("Yes").replace(
            r#"<pre class="js-sourcecopyarea">pragma"#,
            "<pre class=\"js-sourcecopyarea\">\n\npragma",
        );
        let info = from_contract_page(&page).unwrap();
        assert!(info.sourcecode.starts_with("\n\npragma solidity"));

        let info = from_contract_page(&contract_page("Yes")).unwrap();
        assert!(info.sourcecode.starts_with("pragma solidity"));
    }

    #[test]
    fn optimized_rounds_reads_leading_digits() {
        let page = contract_page("Yes").replace(" 200 ", "200 runs");
        assert_eq!(from_contract_page(&page).unwrap().optimized_rounds, 200);

        let page = contract_page("Yes").replace(" 200 ", "0");
        assert_eq!(from_contract_page(&page).unwrap().optimized_rounds, 0);
    }

    #[test]
    fn invalid_values() {
        let page = contract_page("Yes").replace(" 200 ", "many");
        assert!(matches!(from_contract_page(&page), Err(Error::ScrapeInvalidField("optimizedRounds", _))));

        let page = contract_page("Yes").replace(" 200 ", "");
        assert!(matches!(from_contract_page(&page), Err(Error::ScrapeInvalidField("optimizedRounds", _))));

        let page = contract_page("Yes").replace("0x6060604052", "0x60606");
        assert!(matches!(from_contract_page(&page), Err(Error::ScrapeInvalidField("bytecode", _))));

        let page = contract_page("Yes").replace("0x6060604052", "<span>0x6060604052</span>");
        assert!(matches!(from_contract_page(&page), Err(Error::ScrapeMissingField("bytecode"))));
    }
}
