//! Route file loading

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Standard
use std::{fs::File, io::Read, path::Path};

// External
use log::debug;

// Internal
use super::{Route, RouteError};
use crate::geom::Pose;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Route {
    /// Load a route from a file on disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RouteError> {
        let file = File::open(path.as_ref()).map_err(RouteError::FileError)?;

        let route = Self::from_reader(file)?;

        debug!(
            "Loaded route of {} poses from {}",
            route.len(),
            path.as_ref().display()
        );

        Ok(route)
    }

    /// Parse a route from any reader.
    ///
    /// Each non-empty line is one `x,y,heading_rad` record, lines starting with `#` are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RouteError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut poses = Vec::new();

        for result in csv_reader.records() {
            let record = result.map_err(|e| RouteError::Parse {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                source: e,
            })?;

            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let (x, y, heading): (f64, f64, f64) = record
                .deserialize(None)
                .map_err(|e| RouteError::Parse { line, source: e })?;

            if !(x.is_finite() && y.is_finite() && heading.is_finite()) {
                return Err(RouteError::NonFinite { line });
            }

            poses.push(Pose::new(x, y, heading));
        }

        Route::new(poses)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_reader() {
        let data = "# x,y,heading\n0.0, 0.0, 0.0\n0.5,0.0,0.0\n\n1.0,0.5,1.5707963\n";

        let route = Route::from_reader(data.as_bytes()).unwrap();

        assert_eq!(route.len(), 3);
        assert!((route[2].position_m.y - 0.5).abs() < 1e-12);
        assert!((route[2].heading_rad - 1.5707963).abs() < 1e-12);
    }

    #[test]
    fn test_malformed() {
        let data = "0.0,0.0,0.0\n0.5,oops,0.0\n";
        match Route::from_reader(data.as_bytes()) {
            Err(RouteError::Parse { line, .. }) => assert_eq!(line, 2),
            r => panic!("Expected parse error, got {:?}", r),
        }

        let data = "0.0,0.0\n";
        assert!(matches!(
            Route::from_reader(data.as_bytes()),
            Err(RouteError::Parse { .. })
        ));

        let data = "0.0,NaN,0.0\n";
        assert!(matches!(
            Route::from_reader(data.as_bytes()),
            Err(RouteError::NonFinite { line: 1 })
        ));
    }

    #[test]
    fn test_load_file() {
        let route =
            Route::load(concat!(env!("CARGO_MANIFEST_DIR"), "/../data/routes/l_route.csv"))
                .unwrap();

        assert_eq!(route.len(), 141);
        assert!((route.last().heading_rad - std::f64::consts::FRAC_PI_2).abs() < 1e-6);

        assert!(matches!(
            Route::load("/does/not/exist.csv"),
            Err(RouteError::FileError(_))
        ));
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(
            Route::from_reader("# nothing\n".as_bytes()),
            Err(RouteError::Empty)
        ));
    }
}
