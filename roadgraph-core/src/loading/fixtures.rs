use std::path::Path;

use super::CsvStore;

/// Four roads forming a ladder: Main St (y = 0) and I-10 (y = 1) joined by
/// Elm St (x = 1) and Oak Ave (x = 3). Springfield sits on Main St at x = 2.
pub(crate) fn write_sample_store(dir: &Path) {
    std::fs::write(
        dir.join(CsvStore::ROADS_FILE),
        "linearid,fullname,rttyp,mtfcc,geom\n\
         1101,Main St,M,S1400,\"LINESTRING(0 0,1 0,2 0,3 0,4 0)\"\n\
         1102,Elm St,M,S1400,\"LINESTRING(1 -1,1 0,1 1)\"\n\
         1103,Oak Ave,M,S1400,\"MULTILINESTRING((3 -1,3 0),(3 0,3 1))\"\n\
         1104,I-10,I,S1100,\"LINESTRING(1 1,2 1,3 1)\"\n",
    )
    .unwrap();
    std::fs::write(
        dir.join(CsvStore::INTERSECTIONS_FILE),
        "r1id,r1name,r2id,r2name,intersection_point\n\
         1103,Oak Ave,1104,I-10,POINT(3 1)\n\
         1101,Main St,1102,Elm St,POINT(1 0)\n\
         1102,Elm St,1104,I-10,POINT(1 1)\n\
         1101,Main St,1103,Oak Ave,\"MULTIPOINT((3 0))\"\n",
    )
    .unwrap();
    std::fs::write(
        dir.join(CsvStore::PLACES_FILE),
        "gid,name,state_name,host_road_id,location,centroid\n\
         101,Springville,IL,1104,POINT(2 1),\n\
         100,Springfield,IL,1101,POINT(2 0),POINT(2 0)\n\
         102,Shelbyville,IL,1102,POINT(1 0.5),POINT(1.2 0.5)\n",
    )
    .unwrap();
}
