pub mod point_in_polygon;
