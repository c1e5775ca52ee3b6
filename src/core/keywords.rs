//! Builtin keyword schemas.

use crate::domain::schema::{ItemSchema, KeywordSchema};

const SECTION_AND_FLAG_KEYWORDS: &[&str] = &[
    "RUNSPEC", "GRID", "EDIT", "PROPS", "REGIONS", "SOLUTION", "SUMMARY", "SCHEDULE", "END",
    "OIL", "WATER", "GAS", "DISGAS", "VAPOIL", "METRIC", "FIELD",
];

fn grid_property(name: &str, dimension: Option<&str>) -> KeywordSchema {
    let mut data = ItemSchema::float("DATA").tail();
    if let Some(dimension) = dimension {
        data = data.with_dimension(dimension);
    }
    KeywordSchema::single(name, vec![data])
}

fn date_items() -> Vec<ItemSchema> {
    vec![
        ItemSchema::int("DAY"),
        ItemSchema::string("MONTH"),
        ItemSchema::int("YEAR"),
        ItemSchema::string("TIME").with_default("00:00:00"),
    ]
}

pub fn builtin_schemas() -> Vec<KeywordSchema> {
    let mut schemas: Vec<KeywordSchema> = SECTION_AND_FLAG_KEYWORDS
        .iter()
        .map(|name| KeywordSchema::flag(name))
        .collect();

    schemas.extend([
        KeywordSchema::single("TITLE", vec![ItemSchema::string("TEXT").tail()]),
        KeywordSchema::single(
            "DIMENS",
            vec![
                ItemSchema::int("NX"),
                ItemSchema::int("NY"),
                ItemSchema::int("NZ"),
            ],
        ),
        KeywordSchema::single("START", date_items()),
        KeywordSchema::single(
            "TABDIMS",
            vec![
                ItemSchema::int("NTSFUN").with_default(1),
                ItemSchema::int("NTPVT").with_default(1),
                ItemSchema::int("NSSFUN").with_default(20),
                ItemSchema::int("NPPVT").with_default(20),
                ItemSchema::int("NTFIP").with_default(1),
                ItemSchema::int("NRPVT").with_default(20),
            ],
        ),
        KeywordSchema::single(
            "WELLDIMS",
            vec![
                ItemSchema::int("MAXWELLS").with_default(0),
                ItemSchema::int("MAXCONN").with_default(0),
                ItemSchema::int("MAXGROUPS").with_default(0),
                ItemSchema::int("MAX_GROUPSIZE").with_default(0),
            ],
        ),
        KeywordSchema::single(
            "EQLDIMS",
            vec![
                ItemSchema::int("NTEQUL").with_default(1),
                ItemSchema::int("DEPTH_NODES_P").with_default(100),
                ItemSchema::int("DEPTH_NODES_TAB").with_default(20),
            ],
        ),
        grid_property("DX", Some("Length")),
        grid_property("DY", Some("Length")),
        grid_property("DZ", Some("Length")),
        grid_property("TOPS", Some("Length")),
        grid_property("PORO", None),
        grid_property("PERMX", Some("Permeability")),
        grid_property("PERMY", Some("Permeability")),
        grid_property("PERMZ", Some("Permeability")),
        KeywordSchema::single(
            "DENSITY",
            vec![
                ItemSchema::float("OIL")
                    .with_default(600.0)
                    .with_dimension("Density"),
                ItemSchema::float("WATER")
                    .with_default(999.014)
                    .with_dimension("Density"),
                ItemSchema::float("GAS")
                    .with_default(1.0)
                    .with_dimension("Density"),
            ],
        ),
        KeywordSchema::single(
            "PVTW",
            vec![
                ItemSchema::float("P_REF").with_dimension("Pressure"),
                ItemSchema::float("WATER_VOL_FACTOR").with_default(1.0),
                ItemSchema::float("WATER_COMPRESSIBILITY")
                    .with_default(4.0e-5)
                    .with_dimension("1/Pressure"),
                ItemSchema::float("WATER_VISCOSITY")
                    .with_default(0.5)
                    .with_dimension("Viscosity"),
                ItemSchema::float("WATER_VISCOSIBILITY")
                    .with_default(0.0)
                    .with_dimension("1/Pressure"),
            ],
        ),
        KeywordSchema::single("SWOF", vec![ItemSchema::float("DATA").tail()]),
        KeywordSchema::single("SGOF", vec![ItemSchema::float("DATA").tail()]),
        KeywordSchema::table(
            "WELSPECS",
            vec![
                ItemSchema::string("WELL"),
                ItemSchema::string("GROUP"),
                ItemSchema::int("HEAD_I"),
                ItemSchema::int("HEAD_J"),
                ItemSchema::float("REF_DEPTH")
                    .with_default(0.0)
                    .with_dimension("Length"),
                ItemSchema::string("PHASE"),
            ],
        ),
        KeywordSchema::table(
            "COMPDAT",
            vec![
                ItemSchema::string("WELL"),
                ItemSchema::int("I").with_default(0),
                ItemSchema::int("J").with_default(0),
                ItemSchema::int("K1"),
                ItemSchema::int("K2"),
                ItemSchema::string("STATE").with_default("OPEN"),
                ItemSchema::int("SAT_TABLE").with_default(0),
                ItemSchema::float("CONNECTION_FACTOR")
                    .with_default(0.0)
                    .with_dimension("Transmissibility"),
                ItemSchema::float("DIAMETER")
                    .with_default(0.0)
                    .with_dimension("Length"),
                ItemSchema::float("KH")
                    .with_default(-1.0)
                    .with_dimension("Permeability*Length"),
                ItemSchema::float("SKIN").with_default(0.0),
                ItemSchema::float("D_FACTOR").with_default(0.0),
                ItemSchema::string("DIR").with_default("Z"),
            ],
        ),
        KeywordSchema::table(
            "WCONPROD",
            vec![
                ItemSchema::string("WELL"),
                ItemSchema::string("STATUS").with_default("OPEN"),
                ItemSchema::string("CMODE"),
                ItemSchema::float("ORAT")
                    .with_default(0.0)
                    .with_dimension("LiquidSurfaceVolume/Time"),
                ItemSchema::float("WRAT")
                    .with_default(0.0)
                    .with_dimension("LiquidSurfaceVolume/Time"),
                ItemSchema::float("GRAT")
                    .with_default(0.0)
                    .with_dimension("GasSurfaceVolume/Time"),
                ItemSchema::float("LRAT")
                    .with_default(0.0)
                    .with_dimension("LiquidSurfaceVolume/Time"),
                ItemSchema::float("RESV")
                    .with_default(0.0)
                    .with_dimension("ReservoirVolume/Time"),
                ItemSchema::float("BHP")
                    .with_default(0.0)
                    .with_dimension("Pressure"),
                ItemSchema::float("THP")
                    .with_default(0.0)
                    .with_dimension("Pressure"),
                ItemSchema::int("VFP_TABLE").with_default(0),
            ],
        ),
        KeywordSchema::table(
            "WCONINJE",
            vec![
                ItemSchema::string("WELL"),
                ItemSchema::string("TYPE"),
                ItemSchema::string("STATUS").with_default("OPEN"),
                ItemSchema::string("CMODE"),
                ItemSchema::float("RATE")
                    .with_default(0.0)
                    .with_dimension("SurfaceVolume/Time"),
                ItemSchema::float("RESV")
                    .with_default(0.0)
                    .with_dimension("ReservoirVolume/Time"),
                ItemSchema::float("BHP")
                    .with_default(6891.2)
                    .with_dimension("Pressure"),
                ItemSchema::float("THP")
                    .with_default(0.0)
                    .with_dimension("Pressure"),
                ItemSchema::int("VFP_TABLE").with_default(0),
            ],
        ),
        KeywordSchema::single(
            "TSTEP",
            vec![ItemSchema::float("STEP_SIZE").tail().with_dimension("Time")],
        ),
        KeywordSchema::table("DATES", date_items()),
    ]);

    schemas
}
